//! Filesystem-backed storage
//!
//! Maps the storage model onto a directory tree: a scope is a directory
//! relative to the root, a resource is a regular file inside it.

use super::{ResourceRef, ResourceScope, StorageClient, TransferProgress};
use crate::error::TransferError;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

const READ_CHUNK: usize = 64 * 1024;

/// Storage service reading from a local directory tree
#[derive(Clone, Debug)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Create a storage rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a file inside the tree into a resource reference
    pub async fn resource(
        &self,
        scope: &ResourceScope,
        name: &str,
    ) -> Result<ResourceRef, TransferError> {
        self.find_item(scope, name)
            .await?
            .ok_or_else(|| TransferError::NotFound(format!("{}/{}", scope.id(), name)))
    }

    fn scope_dir(&self, scope: &ResourceScope) -> PathBuf {
        if scope.id().is_empty() {
            self.root.clone()
        } else {
            self.root.join(scope.id())
        }
    }
}

/// Names must address a file directly inside its scope
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

#[async_trait::async_trait]
impl StorageClient for FsStorage {
    async fn download(
        &self,
        resource: &ResourceRef,
        progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<Vec<u8>, TransferError> {
        let path = self.root.join(&resource.id);
        let mut file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(TransferError::NotFound(resource.download_path()))
            }
            Err(err) => return Err(err.into()),
        };
        let total = file.metadata().await?.len();

        let mut content = Vec::with_capacity(total as usize);
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let read = file.read(&mut chunk).await?;
            if read == 0 {
                break;
            }
            content.extend_from_slice(&chunk[..read]);
            progress(TransferProgress {
                loaded: content.len() as u64,
                total: Some(total),
            });
        }

        Ok(content)
    }

    async fn find_item(
        &self,
        scope: &ResourceScope,
        name: &str,
    ) -> Result<Option<ResourceRef>, TransferError> {
        if !is_plain_file_name(name) {
            log::debug!("Rejected lookup of {name:?} in {scope}");
            return Ok(None);
        }

        let path = self.scope_dir(scope).join(name);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let id = if scope.id().is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", scope.id(), name)
        };
        let mut resource = ResourceRef::new(id, name, metadata.len(), scope.clone());
        resource.resource_kind = "file".to_string();
        Ok(Some(resource))
    }

    fn backend_name(&self) -> &'static str {
        "Filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("obj_preview-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(dir.join("models")).unwrap();
        dir
    }

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("box.obj"));
        assert!(is_plain_file_name("my box.mtl"));
        assert!(!is_plain_file_name("../secret"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(""));
    }

    #[tokio::test]
    async fn test_find_and_download() {
        let dir = scratch_dir();
        std::fs::write(dir.join("models/box.obj"), b"v 1 2 3\n").unwrap();
        let storage = FsStorage::new(&dir);
        let scope = ResourceScope::new("models");

        let resource = storage.resource(&scope, "box.obj").await.unwrap();
        assert_eq!(resource.size, 8);
        assert_eq!(resource.download_path(), "file/models/box.obj/download");

        let bytes = storage.download(&resource, &|_: TransferProgress| {}).await.unwrap();
        assert_eq!(bytes, b"v 1 2 3\n");

        let missing = storage.find_item(&scope, "box.mtl").await.unwrap();
        assert!(missing.is_none());

        std::fs::remove_dir_all(dir).unwrap();
    }
}

//! In-memory storage for testing
//!
//! Provides a storage service that keeps every resource in memory,
//! reports progress in fixed-size chunks, and can be told to fail.

use super::{ResourceRef, ResourceScope, StorageClient, TransferProgress};
use crate::error::TransferError;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter for generating unique resource IDs
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> String {
    format!("mem-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// A request the storage has served, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageRequest {
    Download(String),
    Lookup { scope: String, name: String },
}

#[derive(Debug, Default)]
struct MemoryState {
    resources: HashMap<String, (ResourceRef, Arc<Vec<u8>>)>,
    failing: HashSet<String>,
    requests: Vec<StorageRequest>,
}

/// In-memory storage service
///
/// Clones share the same contents.
#[derive(Clone, Debug)]
pub struct MemoryStorage {
    state: Arc<RwLock<MemoryState>>,
    chunk_size: usize,
    report_total: bool,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Create an empty storage that reports progress in 4 KiB chunks
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
            chunk_size: 4 * 1024,
            report_total: true,
        }
    }

    /// Report progress every `chunk_size` bytes
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Omit the total length from progress reports
    pub fn without_total(mut self) -> Self {
        self.report_total = false;
        self
    }

    /// Store `content` as a resource named `name` inside `scope`
    pub fn insert(&self, scope: &ResourceScope, name: &str, content: Vec<u8>) -> ResourceRef {
        let resource = ResourceRef::new(next_id(), name, content.len() as u64, scope.clone());
        self.state
            .write()
            .resources
            .insert(resource.id.clone(), (resource.clone(), Arc::new(content)));
        resource
    }

    /// Make every download of `id` fail with status 500
    pub fn fail_downloads_of(&self, id: &str) {
        self.state.write().failing.insert(id.to_string());
    }

    /// Requests served so far
    pub fn requests(&self) -> Vec<StorageRequest> {
        self.state.read().requests.clone()
    }

    /// Number of downloads served so far
    pub fn download_count(&self) -> usize {
        self.state
            .read()
            .requests
            .iter()
            .filter(|r| matches!(r, StorageRequest::Download(_)))
            .count()
    }

    /// Number of lookups served so far
    pub fn lookup_count(&self) -> usize {
        self.state
            .read()
            .requests
            .iter()
            .filter(|r| matches!(r, StorageRequest::Lookup { .. }))
            .count()
    }
}

#[async_trait::async_trait]
impl StorageClient for MemoryStorage {
    async fn download(
        &self,
        resource: &ResourceRef,
        progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<Vec<u8>, TransferError> {
        let content = {
            let mut state = self.state.write();
            state
                .requests
                .push(StorageRequest::Download(resource.id.clone()));

            if state.failing.contains(&resource.id) {
                return Err(TransferError::Status {
                    resource: resource.download_path(),
                    status: 500,
                });
            }

            match state.resources.get(&resource.id) {
                Some((_, content)) => Arc::clone(content),
                None => return Err(TransferError::NotFound(resource.download_path())),
            }
        };

        let total = content.len() as u64;
        let mut loaded = 0u64;
        for chunk in content.chunks(self.chunk_size) {
            loaded += chunk.len() as u64;
            progress(TransferProgress {
                loaded,
                total: self.report_total.then_some(total),
            });
        }

        Ok(content.as_ref().clone())
    }

    async fn find_item(
        &self,
        scope: &ResourceScope,
        name: &str,
    ) -> Result<Option<ResourceRef>, TransferError> {
        let mut state = self.state.write();
        state.requests.push(StorageRequest::Lookup {
            scope: scope.id().to_string(),
            name: name.to_string(),
        });

        // First match wins, like the first element of a lookup response
        let mut matches: Vec<&ResourceRef> = state
            .resources
            .values()
            .map(|(resource, _)| resource)
            .filter(|resource| &resource.scope == scope && resource.name == name)
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(matches.first().map(|resource| (*resource).clone()))
    }

    fn backend_name(&self) -> &'static str {
        "Memory"
    }
}

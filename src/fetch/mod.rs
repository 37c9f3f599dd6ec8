//! Byte fetching from the storage service
//!
//! The storage service is abstracted behind [`StorageClient`] so the
//! pipeline can run against a remote data-management server, a local
//! directory tree, or an in-memory fixture.

pub mod mock;
#[cfg(feature = "runtime-tokio")]
pub mod fs;

use crate::async_loading::LoadHandle;
use crate::error::TransferError;
use crate::runtime::bounded;
use futures::future::try_join_all;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;

pub use mock::MemoryStorage;
#[cfg(feature = "runtime-tokio")]
pub use fs::FsStorage;

/// Containment scope ("folder") that groups sibling resources by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceScope(pub String);

impl ResourceScope {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// Query used to find a single named resource inside this scope
    pub fn lookup_query(&self, name: &str) -> String {
        format!("item?folderId={}&name={}", self.0, name)
    }
}

impl fmt::Display for ResourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "folder {}", self.0)
    }
}

/// A fetchable resource (an "item") known to the storage service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    /// Opaque identifier assigned by the storage service
    pub id: String,
    /// File name, used for cross-references between OBJ/MTL/image files
    pub name: String,
    /// Size in bytes as reported by the storage service
    pub size: u64,
    /// Scope the resource lives in
    pub scope: ResourceScope,
    /// Resource kind segment of the download route, usually `item`
    pub resource_kind: String,
}

impl ResourceRef {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        size: u64,
        scope: ResourceScope,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            size,
            scope,
            resource_kind: "item".to_string(),
        }
    }

    /// Route that streams the resource content
    pub fn download_path(&self) -> String {
        format!("{}/{}/download", self.resource_kind, self.id)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.resource_kind, self.id, self.name)
    }
}

/// One progress report from the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes received so far for this transfer
    pub loaded: u64,
    /// Total length, when the transport knows it
    pub total: Option<u64>,
}

/// How fetched bytes should be handed back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentMode {
    Text,
    Binary,
}

/// Content of a fetched resource
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedContent {
    Text(String),
    Binary(Vec<u8>),
}

impl FetchedContent {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }
}

/// Storage service collaborator
///
/// Uses async-trait for dyn compatibility
#[async_trait::async_trait]
pub trait StorageClient: Send + Sync + Debug {
    /// Download the full content of a resource, reporting progress as bytes arrive
    async fn download(
        &self,
        resource: &ResourceRef,
        progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<Vec<u8>, TransferError>;

    /// Find the resource named `name` inside `scope`, if there is one
    async fn find_item(
        &self,
        scope: &ResourceScope,
        name: &str,
    ) -> Result<Option<ResourceRef>, TransferError>;

    /// Name of the backend (for debugging)
    fn backend_name(&self) -> &'static str;
}

/// Observer invoked with a resource and the cumulative bytes received for it
pub type ProgressCallback = Arc<dyn Fn(&ResourceRef, u64) + Send + Sync>;

/// Aggregates transfer progress across concurrent fetches
pub struct ProgressTracker {
    callback: Option<ProgressCallback>,
    handle: Option<LoadHandle>,
    loaded: Mutex<HashMap<String, u64>>,
}

impl Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("has_callback", &self.callback.is_some())
            .field("total_loaded", &self.total_loaded())
            .finish()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ProgressTracker {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            handle: None,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Mirror the aggregate byte count into a load handle
    pub fn with_handle(mut self, handle: LoadHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Record a transport report for `resource`.
    ///
    /// Counts never move backwards, so a transport that restarts its
    /// counter (or omits the total) keeps a running total.
    pub fn record(&self, resource: &ResourceRef, progress: TransferProgress) {
        let loaded = match progress.total {
            Some(total) => progress.loaded.min(total),
            None => progress.loaded,
        };
        self.advance(resource, loaded);
    }

    /// Record a finished transfer of `len` bytes
    pub fn finish(&self, resource: &ResourceRef, len: u64) {
        self.advance(resource, len);
    }

    fn advance(&self, resource: &ResourceRef, loaded: u64) {
        let (cumulative, total) = {
            let mut map = self.loaded.lock();
            let entry = map.entry(resource.id.clone()).or_insert(0);
            if loaded <= *entry {
                return;
            }
            *entry = loaded;
            (loaded, map.values().sum::<u64>())
        };

        if let Some(handle) = &self.handle {
            handle.set_bytes_loaded(total);
        }
        if let Some(callback) = &self.callback {
            callback(resource, cumulative);
        }
    }

    /// Bytes received for one resource
    pub fn loaded_for(&self, resource: &ResourceRef) -> u64 {
        self.loaded.lock().get(&resource.id).copied().unwrap_or(0)
    }

    /// Bytes received across every resource of this load
    pub fn total_loaded(&self) -> u64 {
        self.loaded.lock().values().sum()
    }
}

/// Decode fetched bytes as text, replacing invalid sequences
pub(crate) fn decode_text(name: &str, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            log::warn!("{name} is not valid UTF-8; invalid sequences replaced");
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    }
}

/// Fetches resource content through a storage client
#[derive(Debug, Clone, Copy)]
pub struct Fetcher<'a> {
    storage: &'a dyn StorageClient,
    tracker: &'a ProgressTracker,
    timeout: Option<Duration>,
}

impl<'a> Fetcher<'a> {
    pub fn new(storage: &'a dyn StorageClient, tracker: &'a ProgressTracker) -> Self {
        Self {
            storage,
            tracker,
            timeout: None,
        }
    }

    /// Bound every individual request
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn storage(&self) -> &'a dyn StorageClient {
        self.storage
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Fetch one resource as text or bytes
    pub async fn fetch(
        &self,
        resource: &ResourceRef,
        mode: ContentMode,
    ) -> Result<FetchedContent, TransferError> {
        let tracker = self.tracker;
        let report = |progress: TransferProgress| tracker.record(resource, progress);

        let bytes = bounded(self.timeout, self.storage.download(resource, &report))
            .await
            .map_err(|after| TransferError::TimedOut {
                resource: resource.to_string(),
                after,
            })??;

        tracker.finish(resource, bytes.len() as u64);
        log::debug!("Fetched {} ({} bytes)", resource, bytes.len());

        Ok(match mode {
            ContentMode::Text => FetchedContent::Text(decode_text(&resource.name, bytes)),
            ContentMode::Binary => FetchedContent::Binary(bytes),
        })
    }

    /// Fetch several resources concurrently; any failure fails the batch
    pub async fn fetch_all(
        &self,
        resources: &[ResourceRef],
        mode: ContentMode,
    ) -> Result<Vec<FetchedContent>, TransferError> {
        try_join_all(resources.iter().map(|resource| self.fetch(resource, mode))).await
    }
}

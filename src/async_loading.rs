//! Load state tracking
//!
//! A [`LoadHandle`] lets a hosting view poll how far a model load has
//! come while the reader runs.

use parking_lot::RwLock as SyncRwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Represents the current stage of a model load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// Loading has not started yet
    Pending,

    /// Downloading the OBJ file or the bundle
    FetchingModel,

    /// Locating and downloading material libraries
    FetchingMaterials,

    /// Locating and downloading texture images
    FetchingTextures,

    /// Extracting model files from a bundle
    Unpacking,

    /// Decoding files and linking materials to geometry
    Building,

    /// Loading completed with this many renderable units
    Completed(usize),

    /// Loading failed with an error message
    Failed(String),
}

#[derive(Debug)]
struct LoadShared {
    state: SyncRwLock<LoadState>,
    bytes_loaded: AtomicU64,
}

/// Shared view of one model load
#[derive(Debug, Clone)]
pub struct LoadHandle {
    id: Uuid,
    shared: Arc<LoadShared>,
}

impl Default for LoadHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadHandle {
    /// Create a new load handle
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            shared: Arc::new(LoadShared {
                state: SyncRwLock::new(LoadState::Pending),
                bytes_loaded: AtomicU64::new(0),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the current load state
    pub fn state(&self) -> LoadState {
        self.shared.state.read().clone()
    }

    /// Set the state (for reader orchestration)
    pub fn set_state(&self, state: LoadState) {
        log::debug!("Load {}: {:?}", self.id, state);
        *self.shared.state.write() = state;
    }

    /// Check if loading is complete
    pub fn is_ready(&self) -> bool {
        matches!(*self.shared.state.read(), LoadState::Completed(_))
    }

    /// Check if loading failed
    pub fn is_failed(&self) -> bool {
        matches!(*self.shared.state.read(), LoadState::Failed(_))
    }

    /// Check if loading is still in progress
    pub fn is_loading(&self) -> bool {
        !self.is_ready() && !self.is_failed()
    }

    /// Coarse loading progress (0.0 to 1.0)
    pub fn progress(&self) -> f32 {
        match &*self.shared.state.read() {
            LoadState::Pending => 0.0,
            LoadState::FetchingModel => 0.1,
            LoadState::Unpacking | LoadState::FetchingMaterials => 0.4,
            LoadState::FetchingTextures => 0.6,
            LoadState::Building => 0.9,
            LoadState::Completed(_) => 1.0,
            LoadState::Failed(_) => 0.0,
        }
    }

    /// Bytes transferred so far across every file of the load
    pub fn bytes_loaded(&self) -> u64 {
        self.shared.bytes_loaded.load(Ordering::Relaxed)
    }

    pub(crate) fn set_bytes_loaded(&self, bytes: u64) {
        self.shared.bytes_loaded.store(bytes, Ordering::Relaxed);
    }
}

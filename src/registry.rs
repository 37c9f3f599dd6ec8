//! Reader registry
//!
//! Maps a model kind (the lowercased file extension, e.g. `obj`) and a
//! resource topology to a factory producing [`ModelReader`]s. The registry
//! is an ordinary value owned by the application and passed to whatever
//! picks readers.

use crate::error::{PreviewError, Result};
use crate::fetch::StorageClient;
use crate::reader::{ModelReader, ResourceTopology};
use crate::texture::extension;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a fresh reader for every load
pub type ReaderFactory = Arc<dyn Fn() -> ModelReader + Send + Sync>;

/// Model kind of a file: its lowercased extension
pub fn model_kind(file_name: &str) -> Option<String> {
    extension(file_name)
}

/// Lookup table from (model kind, topology) to reader factory
#[derive(Clone, Default)]
pub struct ReaderRegistry {
    readers: HashMap<String, HashMap<ResourceTopology, ReaderFactory>>,
}

impl fmt::Debug for ReaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<String> = self
            .readers
            .iter()
            .flat_map(|(kind, by_topology)| {
                by_topology.keys().map(move |topology| format!("{kind}/{topology}"))
            })
            .collect();
        entries.sort();
        f.debug_struct("ReaderRegistry").field("readers", &entries).finish()
    }
}

impl ReaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the OBJ readers for both topologies
    pub fn with_defaults(storage: Arc<dyn StorageClient>) -> Self {
        let mut registry = Self::new();
        for topology in [ResourceTopology::Folder, ResourceTopology::Item] {
            let storage = Arc::clone(&storage);
            registry.register("obj", topology, move || {
                ModelReader::new(topology, Arc::clone(&storage))
            });
        }
        registry
    }

    /// Register a factory, replacing any earlier one for the same pair
    pub fn register<F>(&mut self, kind: &str, topology: ResourceTopology, factory: F) -> &mut Self
    where
        F: Fn() -> ModelReader + Send + Sync + 'static,
    {
        let kind = kind.to_ascii_lowercase();
        log::debug!("Registering reader for {kind} on {topology}");
        self.readers
            .entry(kind)
            .or_default()
            .insert(topology, Arc::new(factory));
        self
    }

    /// New reader for `kind` on `topology`, if one is registered
    pub fn lookup(&self, kind: &str, topology: ResourceTopology) -> Option<ModelReader> {
        let factory = self
            .readers
            .get(&kind.to_ascii_lowercase())?
            .get(&topology)?;
        Some(factory())
    }

    /// Like [`lookup`](Self::lookup), failing when nothing is registered
    pub fn reader(&self, kind: &str, topology: ResourceTopology) -> Result<ModelReader> {
        self.lookup(kind, topology)
            .ok_or_else(|| PreviewError::UnknownReader {
                kind: kind.to_string(),
                topology: topology.to_string(),
            })
    }

    /// Whether any topology is registered for `kind`
    pub fn supports(&self, kind: &str) -> bool {
        self.readers
            .get(&kind.to_ascii_lowercase())
            .is_some_and(|by_topology| !by_topology.is_empty())
    }

    /// Whether a file can be previewed, judged by its extension
    pub fn supports_file(&self, file_name: &str) -> bool {
        model_kind(file_name).is_some_and(|kind| self.supports(&kind))
    }
}

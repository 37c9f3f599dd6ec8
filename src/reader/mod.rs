//! Model readers
//!
//! A [`ModelReader`] loads one model from the storage service. Loading runs
//! in two stages: [`assemble`] gathers every file of the model into an
//! [`AssetStore`], then [`build_pipeline`] turns the store into renderable
//! units. The topology of the source decides how the first stage finds the
//! files.

mod bundle;
mod folder;

use crate::async_loading::{LoadHandle, LoadState};
use crate::config::ReaderConfig;
use crate::error::{PreviewError, Result};
use crate::fetch::{Fetcher, ProgressCallback, ProgressTracker, ResourceRef, StorageClient};
use crate::model::RenderableUnit;
use crate::pipeline::build_pipeline;
use crate::store::AssetStore;
use crate::texture::{ImageDecoder, TextureLoader};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How the files of a model are laid out in storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceTopology {
    /// The OBJ, MTL and image files are sibling items of one folder
    Folder,
    /// The files are packed into one zipped item
    Item,
}

impl ResourceTopology {
    /// Topology of an item that holds `file_count` files.
    ///
    /// A single file is a model whose companions live next to it in the
    /// folder; several files are served by the storage service as one bundle.
    pub fn for_file_count(file_count: usize) -> Self {
        if file_count == 1 {
            Self::Folder
        } else {
            Self::Item
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Item => "item",
        }
    }
}

impl fmt::Display for ResourceTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceTopology {
    type Err = PreviewError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "folder" => Ok(Self::Folder),
            "item" => Ok(Self::Item),
            _ => Err(PreviewError::UnknownTopology(s.to_string())),
        }
    }
}

/// A model resource together with the way its files are laid out
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    /// The OBJ item itself; companions are looked up in its folder
    Folder(ResourceRef),
    /// The zipped item holding every file of the model
    Archive(ResourceRef),
}

impl ModelSource {
    pub fn new(topology: ResourceTopology, resource: ResourceRef) -> Self {
        match topology {
            ResourceTopology::Folder => Self::Folder(resource),
            ResourceTopology::Item => Self::Archive(resource),
        }
    }

    pub fn resource(&self) -> &ResourceRef {
        match self {
            Self::Folder(resource) | Self::Archive(resource) => resource,
        }
    }

    pub fn topology(&self) -> ResourceTopology {
        match self {
            Self::Folder(_) => ResourceTopology::Folder,
            Self::Archive(_) => ResourceTopology::Item,
        }
    }
}

/// Gather every file of a model into a store.
///
/// Transfer failures of required files abort; references that cannot be
/// located in the folder are skipped.
pub async fn assemble(
    source: &ModelSource,
    fetcher: &Fetcher<'_>,
    handle: &LoadHandle,
) -> Result<AssetStore> {
    match source {
        ModelSource::Folder(model) => Ok(folder::assemble_folder(model, fetcher, handle).await?),
        ModelSource::Archive(bundle) => bundle::assemble_bundle(bundle, fetcher, handle).await,
    }
}

/// Loads one model from the storage service
///
/// Readers are handed out fresh by the registry and configured with a
/// target before [`ModelReader::run`] is called.
#[derive(Clone)]
pub struct ModelReader {
    topology: ResourceTopology,
    target: Option<ResourceRef>,
    storage: Arc<dyn StorageClient>,
    decoder: Arc<dyn ImageDecoder>,
    config: ReaderConfig,
    progress: Option<ProgressCallback>,
    handle: LoadHandle,
}

impl fmt::Debug for ModelReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelReader")
            .field("topology", &self.topology)
            .field("target", &self.target)
            .field("storage", &self.storage.backend_name())
            .field("config", &self.config)
            .field("has_progress_callback", &self.progress.is_some())
            .field("state", &self.handle.state())
            .finish()
    }
}

impl ModelReader {
    /// Create a reader that decodes textures with [`TextureLoader`]
    pub fn new(topology: ResourceTopology, storage: Arc<dyn StorageClient>) -> Self {
        Self {
            topology,
            target: None,
            storage,
            decoder: Arc::new(TextureLoader::new()),
            config: ReaderConfig::default(),
            progress: None,
            handle: LoadHandle::new(),
        }
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_target(mut self, target: ResourceRef) -> Self {
        self.target = Some(target);
        self
    }

    pub fn set_target(&mut self, target: ResourceRef) {
        self.target = Some(target);
    }

    pub fn target(&self) -> Option<&ResourceRef> {
        self.target.as_ref()
    }

    pub fn topology(&self) -> ResourceTopology {
        self.topology
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Observe download progress as `(resource, cumulative bytes)`
    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: Fn(&ResourceRef, u64) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
    }

    /// Handle for polling this reader's load state
    pub fn handle(&self) -> &LoadHandle {
        &self.handle
    }

    /// Source this reader will load from
    pub fn source(&self) -> Result<ModelSource> {
        let target = self.target.clone().ok_or(PreviewError::MissingSource)?;
        Ok(ModelSource::new(self.topology, target))
    }

    fn tracker(&self) -> ProgressTracker {
        ProgressTracker::new(self.progress.clone()).with_handle(self.handle.clone())
    }

    /// Run only the assembly stage
    pub async fn assemble(&self) -> Result<AssetStore> {
        let source = self.source()?;
        let tracker = self.tracker();
        let fetcher =
            Fetcher::new(self.storage.as_ref(), &tracker).with_timeout(self.config.fetch_timeout());
        assemble(&source, &fetcher, &self.handle).await
    }

    /// Load the target and build its renderable units.
    ///
    /// Either every unit of the model comes back or an error does.
    pub async fn run(&self) -> Result<Vec<RenderableUnit>> {
        let result = self.load().await;
        match &result {
            Ok(units) => self.handle.set_state(LoadState::Completed(units.len())),
            Err(err) => {
                log::error!("Failed to load model: {err}");
                self.handle.set_state(LoadState::Failed(err.to_string()));
            }
        }
        result
    }

    async fn load(&self) -> Result<Vec<RenderableUnit>> {
        let source = self.source()?;
        log::info!(
            "Loading {} ({} topology, {} storage)",
            source.resource(),
            self.topology,
            self.storage.backend_name()
        );

        let store = self.assemble().await?;
        self.handle.set_state(LoadState::Building);
        let units = build_pipeline(store, self.decoder.as_ref(), &self.config).await?;

        log::info!("Loaded {}: {} units", source.resource().name, units.len());
        Ok(units)
    }
}

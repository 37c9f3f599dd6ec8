//! obj_preview - Asset assembly for previewing Wavefront OBJ models
//!
//! # Features
//! - Loads models spread across sibling items of a folder, or zipped into one item
//! - Follows `mtllib` and `map_*` references to material libraries and textures
//! - Tolerates missing companions: geometry renders without the material or texture
//! - Decodes textures concurrently and waits for all of them before handing out units
//! - Reports per-resource download progress
//!
//! # Quick Start
//!
//! ```ignore
//! use obj_preview::{MemoryStorage, ReaderRegistry, ResourceTopology};
//! use std::sync::Arc;
//!
//! let storage = Arc::new(MemoryStorage::new());
//! let registry = ReaderRegistry::with_defaults(storage.clone());
//! let mut reader = registry.reader("obj", ResourceTopology::Folder)?;
//! reader.set_target(item);
//! let units = reader.run().await?;
//! ```
//!
//! # Feature Flags
//!
//! - `runtime-tokio`: Enable request and decode timeouts and the filesystem storage backend

// Core modules
pub mod archive;
pub mod fetch;
pub mod locator;
pub mod pipeline;
pub mod reader;
pub mod references;
pub mod registry;
pub mod store;

// Support modules
pub mod async_loading;
pub mod config;
pub mod model;
pub mod renderer;
mod runtime;
pub mod texture;

// Error types
mod error;
pub use error::{ConfigError, DecodeError, PreviewError, Result, TransferError};

// Re-export fetch types
pub use fetch::mock::StorageRequest;
#[cfg(feature = "runtime-tokio")]
pub use fetch::FsStorage;
pub use fetch::{
    ContentMode, FetchedContent, Fetcher, MemoryStorage, ProgressCallback, ProgressTracker,
    ResourceRef, ResourceScope, StorageClient, TransferProgress,
};

// Re-export pipeline stages
pub use archive::{unpack, UnpackedEntry};
pub use locator::{locate, locate_present};
pub use pipeline::build_pipeline;
pub use reader::{assemble, ModelReader, ModelSource, ResourceTopology};
pub use references::{material_libraries, material_uses, texture_images};
pub use registry::{model_kind, ReaderFactory, ReaderRegistry};
pub use store::{AssetEntry, AssetKind, AssetStore, DecodedAsset, RawContent};

// Re-export model types
pub use model::{
    scene_bounds, Aabb, GeometryGroup, Mesh, RenderableUnit, SurfaceMaterial, TextureBinding,
    TextureSlot, Transform,
};

// Re-export texture types
pub use texture::{ImageDecoder, Texture, TextureError, TextureFormat, TextureLoader};

pub use async_loading::{LoadHandle, LoadState};
pub use config::ReaderConfig;

// Re-export renderer types
pub use renderer::{commit_units, RecordingScene, SceneSink, Vertex};

// Version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Error types for obj_preview

use std::time::Duration;
use thiserror::Error;

/// Failure to move bytes from the storage service
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Request for {resource} failed with status {status}")]
    Status { resource: String, status: u16 },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Transfer of {resource} timed out after {after:?}")]
    TimedOut { resource: String, after: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Malformed model content
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to parse OBJ file {name}: {source}")]
    Obj {
        name: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("Failed to parse MTL file {name}: {source}")]
    Mtl {
        name: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("Corrupt archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error while reading archive: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration loading error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main error type for preview operations
#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("No source resource configured for this reader")]
    MissingSource,

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("No reader registered for model kind '{kind}' on {topology}")]
    UnknownReader { kind: String, topology: String },

    #[error("Unknown resource topology: {0}")]
    UnknownTopology(String),
}

/// Result type alias for preview operations
pub type Result<T> = std::result::Result<T, PreviewError>;

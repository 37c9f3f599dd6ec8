//! Reader configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! fetch_timeout_ms = 30000
//! image_timeout_ms = 5000
//! triangulate = true
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables shared by every stage of a model load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Upper bound for each individual download or lookup, in milliseconds
    pub fetch_timeout_ms: Option<u64>,

    /// Upper bound for each texture image decode, in milliseconds.
    /// An expired wait counts as a failed image.
    pub image_timeout_ms: Option<u64>,

    /// Triangulate polygonal faces while parsing OBJ content
    pub triangulate: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: None,
            image_timeout_ms: None,
            triangulate: true,
        }
    }
}

impl ReaderConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    pub fn image_timeout(&self) -> Option<Duration> {
        self.image_timeout_ms.map(Duration::from_millis)
    }

    pub(crate) fn obj_load_options(&self) -> tobj::LoadOptions {
        tobj::LoadOptions {
            single_index: true,
            triangulate: self.triangulate,
            ..Default::default()
        }
    }
}

//! Editor settings.
//!
//! Every field has a built-in default, so an empty file (or no file at all)
//! is a valid configuration:
//!
//! ```toml
//! [canvas]
//! node_width = 260.0
//! grid_columns = 3
//!
//! [sync]
//! propagate_connections = true
//!
//! [export]
//! default_dialect = "mysql"
//! ```

use crate::graph::Position;
use crate::sql::Dialect;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub canvas: CanvasSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub export: ExportSettings,
}

/// Node sizing and the grid new nodes are placed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub node_width: f64,
    pub grid_origin_x: f64,
    pub grid_origin_y: f64,
    pub grid_step_x: f64,
    pub grid_step_y: f64,
    pub grid_columns: usize,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            node_width: 260.0,
            grid_origin_x: 150.0,
            grid_origin_y: 80.0,
            grid_step_x: 280.0,
            grid_step_y: 250.0,
            grid_columns: 3,
        }
    }
}

impl CanvasSettings {
    /// Default position of the `index`-th node.
    pub fn grid_position(&self, index: usize) -> Position {
        let columns = self.grid_columns.max(1);
        Position::new(
            self.grid_origin_x + (index % columns) as f64 * self.grid_step_x,
            self.grid_origin_y + (index / columns) as f64 * self.grid_step_y,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Append a `Ref:` line to the text when a connection is drawn.
    pub propagate_connections: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            propagate_connections: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub default_dialect: Dialect,
}

impl Settings {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml(&source)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }
}

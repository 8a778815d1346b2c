//! Loader configuration
//!
//! Hosts usually embed these sections in their own TOML config; every field
//! has a default so partial tables are fine.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Loader settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Run the draw-order partitioner after decoding (default: true)
    #[serde(default = "default_true")]
    pub compute_draw_order: bool,
    /// Partitioner tuning
    #[serde(default)]
    pub partition: PartitionConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            compute_draw_order: true,
            partition: PartitionConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Constants for the translucent draw-order partitioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Grid cell edge length in model units (default: 4.0)
    pub cell_size: f32,
    /// Upper bound on cells along each axis; the edge grows to honor it (default: 32)
    pub max_cells_per_axis: u32,
    /// Radius below which a submesh counts as small (default: 2.0)
    pub small_radius: f32,
    /// Radius at or above which a submesh counts as large (default: 15.0)
    pub large_radius: f32,
    /// Viewer eye height; `None` uses the bounding sphere center
    pub eye_height: Option<f32>,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            cell_size: 4.0,
            max_cells_per_axis: 32,
            small_radius: 2.0,
            large_radius: 15.0,
            eye_height: None,
        }
    }
}

fn default_true() -> bool {
    true
}

//! Configuration for viewport grid generation.

use serde::{Deserialize, Serialize};

/// Grid generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Highest globe zoom bucket; also the icosphere subdivision cap.
    pub max_bucket: u32,

    /// Planar lattice spacing in world pixels.
    pub cell_px: f64,

    /// Web Mercator tile size in pixels.
    pub tile_size: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            max_bucket: 7,
            cell_px: 32.0,
            tile_size: 512.0,
        }
    }
}

impl GridConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GRID_MAX_BUCKET") {
            if let Ok(bucket) = val.parse() {
                config.max_bucket = bucket;
            }
        }

        if let Ok(val) = std::env::var("GRID_CELL_PX") {
            if let Ok(px) = val.parse() {
                config.cell_px = px;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        // 10 * 4^9 vertices is already 2.6M points
        if self.max_bucket > 8 {
            return Err("max_bucket must be <= 8".to_string());
        }

        if !(self.cell_px >= 1.0) {
            return Err("cell_px must be >= 1".to_string());
        }

        if !(self.tile_size > 0.0) {
            return Err("tile_size must be > 0".to_string());
        }

        Ok(())
    }
}

//! Sample positions for a map viewport.
//!
//! Two strategies, picked by the view's projection mode:
//! - Globe: icosphere vertices per zoom bucket, cached and indexed, queried
//!   around the view centre ([`globe`])
//! - Planar: a triangular lattice in Web Mercator world pixels covering the
//!   visible bounds ([`planar`])
//!
//! Callers pair each position with a sample from the field sampler.

pub mod cache;
pub mod config;
pub mod globe;
pub mod icosphere;
pub mod planar;

pub use cache::{GridCache, GridCacheStats};
pub use config::GridConfig;
pub use globe::{globe_grid, globe_positions, zoom_bucket};
pub use icosphere::Icosphere;
pub use planar::planar_grid;

use field_common::{Bounds, LngLat};
use serde::{Deserialize, Serialize};

/// What the map host currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Viewport {
    /// 3D globe: visible cap around `center`.
    Globe {
        center: LngLat,
        radius_m: f64,
        zoom: f64,
    },
    /// Web Mercator map: visible bounds, possibly past ±180.
    Planar { bounds: Bounds, zoom: f64 },
}

impl Viewport {
    pub fn zoom(&self) -> f64 {
        match self {
            Viewport::Globe { zoom, .. } | Viewport::Planar { zoom, .. } => *zoom,
        }
    }
}

/// Grid positions for the viewport.
pub fn grid_positions(viewport: &Viewport, cache: &GridCache) -> Vec<LngLat> {
    match viewport {
        Viewport::Globe {
            center,
            radius_m,
            zoom,
        } => globe_grid(*center, *radius_m, *zoom, cache),
        Viewport::Planar { bounds, zoom } => planar_grid(bounds, *zoom, cache.config()),
    }
}

//! Affine mapping between raster pixel space and geographic coordinates.
//!
//! Pixel coordinates are cell indices: `(i, j)` is the centre of cell
//! `(i, j)`, so the top-left corner `(min_lng, max_lat)` sits at
//! `(-0.5, -0.5)`. Sampling, contour tracing and extremum detection all go
//! through this one convention.

use field_common::{Bounds, LngLat};

/// Precomputed affine transform for one grid size and bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    pub width: usize,
    pub height: usize,
    pub bounds: Bounds,
    lng_resolution: f64,
    lat_resolution: f64,
}

impl GridTransform {
    pub fn new(width: usize, height: usize, bounds: Bounds) -> Self {
        Self {
            width,
            height,
            bounds,
            lng_resolution: bounds.width() / width as f64,
            lat_resolution: bounds.height() / height as f64,
        }
    }

    /// Degrees of longitude per pixel.
    pub fn lng_resolution(&self) -> f64 {
        self.lng_resolution
    }

    /// Degrees of latitude per pixel.
    pub fn lat_resolution(&self) -> f64 {
        self.lat_resolution
    }

    /// Geographic position to continuous cell coordinates.
    #[inline]
    pub fn project(&self, position: LngLat) -> [f64; 2] {
        let [lng, lat] = position;
        [
            (lng - self.bounds.min_lng) / self.lng_resolution - 0.5,
            (self.bounds.max_lat - lat) / self.lat_resolution - 0.5,
        ]
    }

    /// Continuous cell coordinates to a geographic position.
    #[inline]
    pub fn unproject(&self, point: [f64; 2]) -> LngLat {
        let [x, y] = point;
        [
            self.bounds.min_lng + (x + 0.5) * self.lng_resolution,
            self.bounds.max_lat - (y + 0.5) * self.lat_resolution,
        ]
    }
}

/// Projection closure for a grid, `(lng, lat) -> (px, py)`.
pub fn project(width: usize, height: usize, bounds: Bounds) -> impl Fn(LngLat) -> [f64; 2] {
    let transform = GridTransform::new(width, height, bounds);
    move |position| transform.project(position)
}

/// Inverse of [`project`], `(px, py) -> (lng, lat)`.
pub fn unproject(width: usize, height: usize, bounds: Bounds) -> impl Fn([f64; 2]) -> LngLat {
    let transform = GridTransform::new(width, height, bounds);
    move |point| transform.unproject(point)
}

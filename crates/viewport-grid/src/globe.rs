//! Globe-mode grid: icosphere vertices around the view centre.

use crate::cache::GridCache;
use crate::icosphere::Icosphere;
use field_common::LngLat;
use tracing::trace;

/// Zoom bucket of a globe view: `clamp(floor(zoom) - 2, 0, max_bucket)`.
pub fn zoom_bucket(zoom: f64, max_bucket: u32) -> u32 {
    if !zoom.is_finite() {
        return 0;
    }
    (zoom.floor() - 2.0).clamp(0.0, max_bucket as f64) as u32
}

/// Geographic positions of an icosphere subdivided `subdivisions` times.
///
/// Texture coordinates map to `lng = u * 360 - 180`, `lat = 90 - v * 180`.
/// The `u = 0` copies of seam vertices and the two poles are dropped, so
/// no position has `lng == -180` or `lat == ±90`.
pub fn globe_positions(subdivisions: u32) -> Vec<LngLat> {
    Icosphere::new(subdivisions)
        .texture_coords()
        .into_iter()
        .filter(|&[u, v]| u != 0.0 && v != 0.0 && v != 1.0)
        .map(|[u, v]| [u * 360.0 - 180.0, 90.0 - v * 180.0])
        .collect()
}

/// Grid positions within `radius_m` meters of `center` at `zoom`.
///
/// Positions come back in the bucket grid's order, so the same view always
/// yields the same list.
pub fn globe_grid(center: LngLat, radius_m: f64, zoom: f64, cache: &GridCache) -> Vec<LngLat> {
    let bucket = zoom_bucket(zoom, cache.config().max_bucket);
    let index = cache.globe_index(bucket);
    let positions: Vec<LngLat> = index
        .around(center, radius_m / 1000.0)
        .into_iter()
        .map(|i| index.positions()[i])
        .collect();

    trace!(
        bucket = bucket,
        radius_m = radius_m,
        points = positions.len(),
        "Globe grid query"
    );
    positions
}

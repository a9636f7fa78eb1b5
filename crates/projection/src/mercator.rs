//! Web Mercator world-pixel coordinates.
//!
//! The world at zoom `z` is a square of `tile_size * 2^z` pixels with
//! `(0, 0)` at `(-180, MAX_LAT)` and y growing southward. Zoom may be
//! fractional.

use field_common::{LngLat, MAX_MERCATOR_LAT};
use std::f64::consts::PI;

/// Side length of the world square in pixels.
pub fn world_size(zoom: f64, tile_size: f64) -> f64 {
    tile_size * 2f64.powf(zoom)
}

/// Geographic position to world pixels. Latitude is clamped to the
/// Mercator limit, longitude is not wrapped.
pub fn lnglat_to_world(position: LngLat, zoom: f64, tile_size: f64) -> [f64; 2] {
    let size = world_size(zoom, tile_size);
    let lat = position[1].clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = (position[0] + 180.0) / 360.0 * size;
    let y = (1.0 - lat.tan().asinh() / PI) / 2.0 * size;
    [x, y]
}

/// World pixels back to a geographic position.
pub fn world_to_lnglat(point: [f64; 2], zoom: f64, tile_size: f64) -> LngLat {
    let size = world_size(zoom, tile_size);
    let lng = point[0] / size * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * point[1] / size)).sinh().atan().to_degrees();
    [lng, lat]
}

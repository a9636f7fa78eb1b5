//! Planar (Web Mercator) grid: a triangular lattice in world pixels.
//!
//! Rows are `cell_px * √3 / 2` apart and odd rows are shifted by half a
//! cell, so neighbouring points form equilateral triangles. The lattice is
//! anchored at the world origin; panning reveals new points without moving
//! the existing ones.

use crate::config::GridConfig;
use field_common::{Bounds, LngLat};
use projection::mercator::{lnglat_to_world, world_size, world_to_lnglat};
use projection::wrap_longitude;
use tracing::trace;

/// Lattice positions covering `bounds` at `zoom`.
///
/// The lattice lives at the integer zoom `floor(zoom)`. Rows on or past
/// the Mercator edges are dropped. Bounds wider than the world are reduced
/// to one period so no point repeats across the antimeridian. Longitudes
/// are wrapped to `[-180, 180)`.
pub fn planar_grid(bounds: &Bounds, zoom: f64, config: &GridConfig) -> Vec<LngLat> {
    let z = if zoom.is_finite() { zoom.floor().max(0.0) } else { 0.0 };
    let world = world_size(z, config.tile_size);
    let step = config.cell_px;
    let row_height = step * 3f64.sqrt() / 2.0;

    let [x0, y0] = lnglat_to_world([bounds.min_lng, bounds.max_lat], z, config.tile_size);
    let [x1, y1] = lnglat_to_world([bounds.max_lng, bounds.min_lat], z, config.tile_size);
    if !(x1 >= x0 && y1 >= y0) {
        return vec![];
    }
    let spans_world = x1 - x0 >= world;

    let first_row = (y0 / row_height).ceil() as i64;
    let last_row = (y1 / row_height).floor() as i64;

    let mut positions = Vec::new();
    for row in first_row..=last_row {
        let y = row as f64 * row_height;
        if y <= 0.0 || y >= world {
            continue;
        }

        let offset = if row.rem_euclid(2) == 1 { step / 2.0 } else { 0.0 };
        let first_col = ((x0 - offset) / step).ceil() as i64;
        let last_col = if spans_world {
            first_col + (world / step).round() as i64 - 1
        } else {
            ((x1 - offset) / step).floor() as i64
        };

        for col in first_col..=last_col {
            let x = col as f64 * step + offset;
            let [lng, lat] = world_to_lnglat([x, y], z, config.tile_size);
            positions.push([wrap_longitude(lng, None), lat]);
        }
    }

    trace!(
        zoom = z,
        bounds = %bounds.cache_key(),
        points = positions.len(),
        "Planar grid"
    );
    positions
}

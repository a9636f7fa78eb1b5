//! Contour (isoline) extraction from a magnitude grid.
//!
//! Pipeline per request:
//!
//! 1. thresholds at every multiple of the interval inside the data range
//! 2. cylinder wrap of globe-spanning grids (one column each side)
//! 3. 3x3 box blur
//! 4. framed marching squares per threshold, in parallel
//! 5. unframing clip, small-line rejection, optional smoothing
//! 6. back to geographic coordinates, re-clipped to the bounds if wrapped

use crate::blur::box_blur;
use crate::clip::{clip_isoline, ClipRect};
use crate::config::EngineConfig;
use crate::isolines::{smooth_isoline, trace_isolines, Isoline};
use field_common::{Bounds, FieldError, FieldResult, LngLat, ScalarGrid};
use projection::GridTransform;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A contour polyline at one threshold.
///
/// Closed rings repeat their first coordinate at the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourFeature {
    pub coordinates: Vec<LngLat>,
    pub value: f64,
}

impl ContourFeature {
    pub fn is_closed(&self) -> bool {
        self.coordinates.len() > 2 && self.coordinates.first() == self.coordinates.last()
    }
}

/// Every multiple of `interval` inside `[min, max]`.
///
/// Levels are computed as `k * interval` so long ranges do not accumulate
/// rounding drift.
pub fn generate_thresholds(min: f64, max: f64, interval: f64) -> Vec<f64> {
    if !(interval > 0.0) || !interval.is_finite() || !min.is_finite() || !max.is_finite() {
        return vec![];
    }
    if max < min {
        return vec![];
    }

    let first = (min / interval).ceil() as i64;
    let last = (max / interval).floor() as i64;
    (first..=last).map(|k| k as f64 * interval).collect()
}

/// Buffer a globe-spanning grid as a cylinder: the last column is copied
/// in front of column 0 and column 0 after the last column.
pub fn wrap_cylinder(grid: &ScalarGrid) -> ScalarGrid {
    let width = grid.width + 2;
    let mut data = Vec::with_capacity(width * grid.height);
    for row in grid.data.chunks(grid.width.max(1)) {
        if let (Some(&first), Some(&last)) = (row.first(), row.last()) {
            data.push(last);
            data.extend_from_slice(row);
            data.push(first);
        }
    }
    ScalarGrid {
        width,
        height: grid.height,
        data,
    }
}

/// Trace contour lines of `grid` over `bounds` every `interval` units.
///
/// Returns features ordered by threshold. An all-NaN grid gives an empty
/// list; a non-positive interval or a grid whose data does not match its
/// dimensions is an error.
pub fn contour_lines(
    grid: &ScalarGrid,
    interval: f64,
    bounds: &Bounds,
    config: &EngineConfig,
) -> FieldResult<Vec<ContourFeature>> {
    grid.check_dimensions()?;
    if !(interval > 0.0) || !interval.is_finite() {
        return Err(FieldError::invalid_parameter(
            "interval",
            format!("must be a positive number, got {}", interval),
        ));
    }

    let Some((min, max)) = grid.min_max() else {
        debug!(width = grid.width, height = grid.height, "No valid cells, no contours");
        return Ok(vec![]);
    };
    let thresholds = generate_thresholds(min, max, interval);

    let wrapped = bounds.is_global();
    let (work, offset) = if wrapped {
        (wrap_cylinder(grid), 1.0)
    } else {
        (grid.clone(), 0.0)
    };
    let work = if config.contour_blur {
        box_blur(&work)
    } else {
        work
    };

    let unframe = ClipRect::inset(work.width as f64, work.height as f64, config.unframe_epsilon);
    let transform = GridTransform::new(grid.width, grid.height, *bounds);
    let geo_rect = ClipRect::from_bounds(bounds);

    let per_level: Vec<(Vec<ContourFeature>, usize)> = thresholds
        .par_iter()
        .map(|&level| {
            let mut features = Vec::new();
            let mut rejected = 0;

            for line in trace_isolines(&work, level) {
                for piece in clip_isoline(&line, &unframe) {
                    if is_small(&piece, config.min_line_extent_px) {
                        rejected += 1;
                        continue;
                    }
                    let piece = smooth_isoline(&piece, config.smoothing_passes);
                    let geo = Isoline {
                        points: piece
                            .points
                            .iter()
                            // tracer nodes sit at i + 0.5 on the pixel edges
                            .map(|p| transform.unproject([p[0] - offset - 0.5, p[1] - 0.5]))
                            .collect(),
                        closed: piece.closed,
                    };

                    if wrapped {
                        for part in clip_isoline(&geo, &geo_rect) {
                            features.push(ContourFeature {
                                coordinates: part.points,
                                value: level,
                            });
                        }
                    } else {
                        features.push(ContourFeature {
                            coordinates: geo.points,
                            value: level,
                        });
                    }
                }
            }
            (features, rejected)
        })
        .collect();

    let rejected: usize = per_level.iter().map(|(_, r)| r).sum();
    let features: Vec<ContourFeature> = per_level.into_iter().flat_map(|(f, _)| f).collect();

    debug!(
        width = grid.width,
        height = grid.height,
        min = min,
        max = max,
        interval = interval,
        levels = thresholds.len(),
        wrapped = wrapped,
        lines = features.len(),
        rejected = rejected,
        "Generated contours"
    );

    Ok(features)
}

/// Whether the line's integer pixel bounding box is narrower than
/// `min_extent` in both axes.
fn is_small(line: &Isoline, min_extent: u32) -> bool {
    let Some((min_x, min_y, max_x, max_y)) = line.bbox() else {
        return true;
    };
    let columns = max_x.ceil() - min_x.floor();
    let rows = max_y.ceil() - min_y.floor();
    let min_extent = min_extent as f64;
    columns < min_extent && rows < min_extent
}

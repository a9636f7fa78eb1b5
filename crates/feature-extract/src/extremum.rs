//! High/low (local extremum) detection with proximity suppression.

use crate::blur::box_blur;
use crate::config::EngineConfig;
use field_common::{Bounds, FieldError, FieldResult, LngLat, ScalarGrid};
use projection::{distance, GridTransform};
use serde::{Deserialize, Serialize};
use spatial_index::SpatialIndex;
use tracing::debug;

/// Whether an extremum is a maximum or a minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtremumKind {
    High,
    Low,
}

/// A surviving local extremum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    pub position: LngLat,
    pub kind: ExtremumKind,
    pub value: f64,
}

/// Detect highs and lows of `grid` at least `radius_km` apart.
///
/// Returns the highs strongest first, followed by the lows strongest
/// first. A flat or all-NaN grid yields an empty list.
pub fn find_extrema(
    grid: &ScalarGrid,
    radius_km: f64,
    bounds: &Bounds,
    config: &EngineConfig,
) -> FieldResult<Vec<Extremum>> {
    grid.check_dimensions()?;
    if !(radius_km >= 0.0) || !radius_km.is_finite() {
        return Err(FieldError::invalid_parameter(
            "radius",
            format!("must be a non-negative number of kilometers, got {}", radius_km),
        ));
    }

    let blurred;
    let work = if config.contour_blur {
        blurred = box_blur(grid);
        &blurred
    } else {
        grid
    };

    let transform = GridTransform::new(grid.width, grid.height, *bounds);
    let (mut highs, mut lows) = scan_extrema(work, &transform);
    let candidates = highs.len() + lows.len();

    // strongest first; stable so scan order breaks ties
    highs.sort_by(|a, b| b.value.total_cmp(&a.value));
    lows.sort_by(|a, b| a.value.total_cmp(&b.value));

    let radius_m = radius_km * 1000.0;
    let highs = suppress_same_kind(highs, radius_m);
    let lows = suppress_same_kind(lows, radius_m);
    let after_same_kind = highs.len() + lows.len();

    let (highs, lows) =
        cross_suppress(highs, lows, radius_m, config.extremum_reference_threshold);

    debug!(
        width = grid.width,
        height = grid.height,
        radius_km = radius_km,
        candidates = candidates,
        suppressed = candidates - after_same_kind,
        cross_suppressed = after_same_kind - highs.len() - lows.len(),
        highs = highs.len(),
        lows = lows.len(),
        "Detected extrema"
    );

    Ok(highs.into_iter().chain(lows).collect())
}

/// Scan interior cells for local extrema.
///
/// A cell is a high when it is `>=` its four neighbours earlier in scan
/// order (NW, N, NE, W) and `>` the four later ones (E, SW, S, SE); the
/// mirrored rule defines a low. Plateaus therefore produce a single
/// candidate. NaN cells and cells next to NaN never qualify.
fn scan_extrema(grid: &ScalarGrid, transform: &GridTransform) -> (Vec<Extremum>, Vec<Extremum>) {
    let mut highs = Vec::new();
    let mut lows = Vec::new();
    if grid.width < 3 || grid.height < 3 {
        return (highs, lows);
    }

    for y in 1..grid.height - 1 {
        for x in 1..grid.width - 1 {
            let v = grid.get(x, y);
            if v.is_nan() {
                continue;
            }

            let earlier = [
                grid.get(x - 1, y - 1),
                grid.get(x, y - 1),
                grid.get(x + 1, y - 1),
                grid.get(x - 1, y),
            ];
            let later = [
                grid.get(x + 1, y),
                grid.get(x - 1, y + 1),
                grid.get(x, y + 1),
                grid.get(x + 1, y + 1),
            ];

            let kind = if earlier.iter().all(|&n| v >= n) && later.iter().all(|&n| v > n) {
                ExtremumKind::High
            } else if earlier.iter().all(|&n| v <= n) && later.iter().all(|&n| v < n) {
                ExtremumKind::Low
            } else {
                continue;
            };

            let extremum = Extremum {
                position: transform.unproject([x as f64, y as f64]),
                kind,
                value: v,
            };
            match kind {
                ExtremumKind::High => highs.push(extremum),
                ExtremumKind::Low => lows.push(extremum),
            }
        }
    }

    (highs, lows)
}

/// Greedy suppression over a strongest-first list: every kept point removes
/// the later points strictly closer than `radius_m`.
fn suppress_same_kind(points: Vec<Extremum>, radius_m: f64) -> Vec<Extremum> {
    if points.len() < 2 || radius_m <= 0.0 {
        return points;
    }

    let index = SpatialIndex::build(points.iter().map(|p| p.position).collect());
    let mut removed = vec![false; points.len()];
    for i in 0..points.len() {
        if removed[i] {
            continue;
        }
        for j in index.around(points[i].position, radius_m / 1000.0) {
            if j > i && distance(points[i].position, points[j].position) < radius_m {
                removed[j] = true;
            }
        }
    }

    points
        .into_iter()
        .zip(removed)
        .filter(|(_, r)| !r)
        .map(|(p, _)| p)
        .collect()
}

/// Drop weak highs and weak lows that sit within `radius_m` of each other.
///
/// In every close high/low pair the high goes when its value is below
/// `reference` and the low goes when its value is above it. All pairs are
/// judged on the input sets before anything is removed.
fn cross_suppress(
    highs: Vec<Extremum>,
    lows: Vec<Extremum>,
    radius_m: f64,
    reference: f64,
) -> (Vec<Extremum>, Vec<Extremum>) {
    if highs.is_empty() || lows.is_empty() || radius_m <= 0.0 {
        return (highs, lows);
    }

    let low_index = SpatialIndex::build(lows.iter().map(|p| p.position).collect());
    let mut drop_high = vec![false; highs.len()];
    let mut drop_low = vec![false; lows.len()];

    for (i, high) in highs.iter().enumerate() {
        for j in low_index.around(high.position, radius_m / 1000.0) {
            if distance(high.position, lows[j].position) >= radius_m {
                continue;
            }
            if high.value < reference {
                drop_high[i] = true;
            }
            if lows[j].value > reference {
                drop_low[j] = true;
            }
        }
    }

    let keep = |points: Vec<Extremum>, dropped: Vec<bool>| -> Vec<Extremum> {
        points
            .into_iter()
            .zip(dropped)
            .filter(|(_, d)| !d)
            .map(|(p, _)| p)
            .collect()
    };
    (keep(highs, drop_high), keep(lows, drop_low))
}

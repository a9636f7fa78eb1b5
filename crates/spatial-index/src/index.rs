//! R-tree backed index over `[lng, lat]` positions.

use field_common::{Bounds, LngLat};
use projection::{distance, EARTH_RADIUS_M};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// Position with its index in the source collection.
#[derive(Clone, Copy, Debug, PartialEq)]
struct IndexedPoint {
    coords: [f64; 2], // [lng, lat]
    index: usize,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.coords)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.coords[0] - point[0];
        let dy = self.coords[1] - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.coords == *point
    }
}

/// Spatial index over a fixed set of positions.
///
/// Built once in O(n log n) by bulk loading; range and radius queries
/// return indices into the original slice, sorted ascending.
pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
    positions: Vec<LngLat>,
}

impl SpatialIndex {
    /// Build the index. Positions with NaN coordinates are kept in
    /// [`positions`](Self::positions) but never returned by queries.
    pub fn build(positions: Vec<LngLat>) -> Self {
        let points = positions
            .iter()
            .enumerate()
            .filter(|(_, p)| !p[0].is_nan() && !p[1].is_nan())
            .map(|(index, p)| IndexedPoint { coords: *p, index })
            .collect();

        Self {
            tree: RTree::bulk_load(points),
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[LngLat] {
        &self.positions
    }

    /// Indices of points inside the planar box (edges inclusive).
    pub fn range(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<usize> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|p| p.index)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Range query for viewports that may straddle the antimeridian.
    ///
    /// Queries the raw bounds and the bounds shifted by -360° and merges
    /// the results.
    pub fn range_wrapped(&self, bounds: &Bounds) -> Vec<usize> {
        let shifted = bounds.shifted(-360.0);
        let mut hits = self.range(bounds.min_lng, bounds.min_lat, bounds.max_lng, bounds.max_lat);
        hits.extend(self.range(shifted.min_lng, shifted.min_lat, shifted.max_lng, shifted.max_lat));
        hits.sort_unstable();
        hits.dedup();
        hits
    }

    /// Indices of points within `radius_km` great-circle distance of
    /// `center`.
    pub fn around(&self, center: LngLat, radius_km: f64) -> Vec<usize> {
        if center[0].is_nan() || center[1].is_nan() || !(radius_km >= 0.0) {
            return vec![];
        }

        let radius_m = radius_km * 1000.0;
        let mut hits = Vec::new();
        for (min_x, min_y, max_x, max_y) in cap_windows(center, radius_m) {
            let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
            hits.extend(
                self.tree
                    .locate_in_envelope(&envelope)
                    .filter(|p| distance(center, p.coords) <= radius_m)
                    .map(|p| p.index),
            );
        }
        hits.sort_unstable();
        hits.dedup();
        hits
    }
}

/// Lng/lat boxes covering the spherical cap of `radius_m` around `center`,
/// split at the antimeridian.
fn cap_windows(center: LngLat, radius_m: f64) -> Vec<(f64, f64, f64, f64)> {
    let angular = radius_m / EARTH_RADIUS_M;
    let margin = 1e-9;
    let dlat = angular.to_degrees() + margin;
    let min_lat = (center[1] - dlat).max(-90.0);
    let max_lat = (center[1] + dlat).min(90.0);

    let cos_lat = center[1].to_radians().cos();
    let sin_r = angular.sin();
    // cap reaches over a pole or covers a hemisphere: every longitude
    if center[1] - dlat <= -90.0
        || center[1] + dlat >= 90.0
        || angular >= std::f64::consts::FRAC_PI_2
        || sin_r >= cos_lat
    {
        return vec![(-180.0, min_lat, 180.0, max_lat)];
    }

    let dlng = (sin_r / cos_lat).asin().to_degrees() + margin;
    let west = center[0] - dlng;
    let east = center[0] + dlng;

    let mut windows = vec![(west.max(-180.0), min_lat, east.min(180.0), max_lat)];
    if west < -180.0 {
        windows.push((west + 360.0, min_lat, 180.0, max_lat));
    }
    if east > 180.0 {
        windows.push((-180.0, min_lat, east - 360.0, max_lat));
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points() -> Vec<LngLat> {
        let mut points = Vec::new();
        for lat in (-80..=80).step_by(10) {
            for lng in (-180..180).step_by(10) {
                points.push([lng as f64, lat as f64]);
            }
        }
        points
    }

    #[test]
    fn test_range_inclusive() {
        let index = SpatialIndex::build(grid_points());
        let hits = index.range(0.0, 0.0, 20.0, 10.0);
        let found: Vec<LngLat> = hits.iter().map(|&i| index.positions()[i]).collect();
        assert_eq!(found.len(), 6);
        assert!(found.contains(&[20.0, 10.0]));
    }

    #[test]
    fn test_range_wrapped_antimeridian() {
        let index = SpatialIndex::build(grid_points());
        // viewport 170..200 covers 170, 180(-180) and 190(-170)
        let hits = index.range_wrapped(&Bounds::new(170.0, 0.0, 200.0, 0.0));
        let mut lngs: Vec<f64> = hits.iter().map(|&i| index.positions()[i][0]).collect();
        lngs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(lngs, vec![-180.0, -170.0, 170.0]);
    }

    #[test]
    fn test_around_matches_brute_force() {
        let index = SpatialIndex::build(grid_points());
        for (center, radius_km) in [
            ([0.0, 0.0], 1500.0),
            ([175.0, 20.0], 2500.0),
            ([-178.0, -60.0], 1200.0),
            ([30.0, 85.0], 900.0),
        ] {
            let hits = index.around(center, radius_km);
            let expected: Vec<usize> = index
                .positions()
                .iter()
                .enumerate()
                .filter(|(_, p)| distance(center, **p) <= radius_km * 1000.0)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(hits, expected, "center {:?}", center);
        }
    }

    #[test]
    fn test_nan_points_are_skipped() {
        let index = SpatialIndex::build(vec![[f64::NAN, 0.0], [0.0, 0.0]]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.range(-1.0, -1.0, 1.0, 1.0), vec![1]);
        assert_eq!(index.around([0.0, 0.0], 10.0), vec![1]);
        assert!(index.around([f64::NAN, 0.0], 10.0).is_empty());
    }
}

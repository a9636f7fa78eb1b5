//! Zoom-stable point decluttering.
//!
//! Visibility is computed level by level from zoom 0 up to the requested
//! (floored) zoom. A point visible at level `z` stays visible at every
//! level above `z`; new points at a finer level are only admitted when no
//! already visible point lies within the elimination radius.
//!
//! Levels are cached per (collection key, mode, zoom) and never mutated
//! once written, so panning and zooming replay identical answers.

use field_common::LngLat;
use projection::mercator::{lnglat_to_world, world_size};
use projection::{wrap_longitude, EARTH_RADIUS_M};
use rstar::RTree;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

/// How distances between candidates are measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclutterMode {
    /// Great-circle distance against `default_radius_km / 2^zoom`.
    Globe,
    /// Web Mercator pixel distance at the level's zoom against `radius_px`.
    Planar,
}

/// Configuration for decluttering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclutterConfig {
    /// Globe elimination radius at zoom 0, halved per zoom level.
    pub default_radius_km: f64,
    /// Planar elimination radius in view pixels.
    pub radius_px: f64,
    /// Web Mercator tile size in pixels.
    pub tile_size: f64,
    /// Highest zoom level ever computed; deeper requests clamp to it.
    pub max_zoom: u32,
}

impl Default for DeclutterConfig {
    fn default() -> Self {
        Self {
            default_radius_km: 3000.0,
            radius_px: 40.0,
            tile_size: 512.0,
            max_zoom: 24,
        }
    }
}

impl DeclutterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DECLUTTER_RADIUS_KM") {
            if let Ok(radius) = val.parse() {
                config.default_radius_km = radius;
            }
        }

        if let Ok(val) = std::env::var("DECLUTTER_RADIUS_PX") {
            if let Ok(radius) = val.parse() {
                config.radius_px = radius;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.default_radius_km > 0.0) {
            return Err("default_radius_km must be > 0".to_string());
        }

        if !(self.radius_px > 0.0) {
            return Err("radius_px must be > 0".to_string());
        }

        if !(self.tile_size > 0.0) {
            return Err("tile_size must be > 0".to_string());
        }

        Ok(())
    }

    /// Globe elimination radius at a zoom level, in kilometers.
    pub fn globe_radius_km(&self, zoom: u32) -> f64 {
        self.default_radius_km / 2f64.powi(zoom as i32)
    }
}

/// Statistics for the declutter cache
#[derive(Debug, Default, Clone)]
pub struct DeclutterStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

type LevelKey = (u64, DeclutterMode, u32);

/// Per-zoom visibility cache.
///
/// Owned by the caller (one per map view, or shared); entries are only
/// appended. [`clear`](Self::clear) drops everything, e.g. on a new data
/// set.
pub struct DeclutterCache {
    config: DeclutterConfig,
    levels: RwLock<HashMap<LevelKey, Arc<Vec<bool>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DeclutterCache {
    pub fn new(config: DeclutterConfig) -> Self {
        Self {
            config,
            levels: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &DeclutterConfig {
        &self.config
    }

    /// Visibility mask of `points` at `zoom`.
    ///
    /// `key` identifies the point collection; the same key must always be
    /// used with the same points (see [`collection_key`]).
    pub fn visible(
        &self,
        key: u64,
        points: &[LngLat],
        zoom: f64,
        mode: DeclutterMode,
    ) -> Arc<Vec<bool>> {
        let target = if zoom.is_finite() && zoom > 0.0 {
            (zoom.floor() as u32).min(self.config.max_zoom)
        } else {
            0
        };

        if let Some(mask) = self.get((key, mode, target)) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return mask;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        // resume from the deepest cached level below the target
        let mut level = 0;
        let mut previous: Option<Arc<Vec<bool>>> = None;
        for z in (0..target).rev() {
            if let Some(mask) = self.get((key, mode, z)) {
                level = z + 1;
                previous = Some(mask);
                break;
            }
        }

        let mut mask = previous.unwrap_or_else(|| Arc::new(vec![false; points.len()]));
        for z in level..=target {
            let next = match mode {
                DeclutterMode::Globe => self.globe_level(points, &mask, z),
                DeclutterMode::Planar => self.planar_level(points, &mask, z),
            };
            mask = self.insert((key, mode, z), next);
        }

        debug!(
            key = key,
            zoom = target,
            computed_from = level,
            visible = mask.iter().filter(|v| **v).count(),
            total = points.len(),
            "Decluttered points"
        );
        mask
    }

    /// Indices of the points visible at `zoom`, in original order.
    pub fn visible_indices(
        &self,
        key: u64,
        points: &[LngLat],
        zoom: f64,
        mode: DeclutterMode,
    ) -> Vec<usize> {
        self.visible(key, points, zoom, mode)
            .iter()
            .enumerate()
            .filter(|(_, v)| **v)
            .map(|(i, _)| i)
            .collect()
    }

    /// Drop every cached level.
    pub fn clear(&self) {
        if let Ok(mut levels) = self.levels.write() {
            levels.clear();
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> DeclutterStats {
        DeclutterStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.levels.read().map(|l| l.len()).unwrap_or(0),
        }
    }

    fn get(&self, key: LevelKey) -> Option<Arc<Vec<bool>>> {
        self.levels.read().ok()?.get(&key).cloned()
    }

    /// Append a level; a concurrent writer that got there first wins so
    /// every reader sees one answer per level.
    fn insert(&self, key: LevelKey, mask: Vec<bool>) -> Arc<Vec<bool>> {
        match self.levels.write() {
            Ok(mut levels) => levels.entry(key).or_insert_with(|| Arc::new(mask)).clone(),
            Err(_) => Arc::new(mask),
        }
    }

    fn globe_level(&self, points: &[LngLat], previous: &[bool], zoom: u32) -> Vec<bool> {
        let radius_m = self.config.globe_radius_km(zoom) * 1000.0;
        // great-circle radius as a chord on the unit sphere
        let chord = 2.0 * (radius_m / EARTH_RADIUS_M / 2.0).min(std::f64::consts::FRAC_PI_2).sin();
        trace!(zoom = zoom, radius_m = radius_m, "Globe declutter level");
        eliminate(points, previous, chord * chord, None, unit_vector)
    }

    fn planar_level(&self, points: &[LngLat], previous: &[bool], zoom: u32) -> Vec<bool> {
        let radius = self.config.radius_px;
        let tile_size = self.config.tile_size;
        let world = world_size(zoom as f64, tile_size);
        trace!(zoom = zoom, radius_px = radius, "Planar declutter level");
        eliminate(points, previous, radius * radius, Some(world), |p| {
            let [x, y] = lnglat_to_world([wrap_longitude(p[0], None), p[1]], zoom as f64, tile_size);
            [x, y, 0.0]
        })
    }
}

/// One elimination pass.
///
/// Candidates are visited in original order. Points visible at the
/// previous level are always kept; any other candidate is dropped when an
/// earlier survivor lies strictly within the radius. With `period` set,
/// x distances wrap around the world width.
fn eliminate<F>(
    points: &[LngLat],
    previous: &[bool],
    radius_2: f64,
    period: Option<f64>,
    embed: F,
) -> Vec<bool>
where
    F: Fn(LngLat) -> [f64; 3],
{
    let shifts = match period {
        Some(width) => vec![-width, 0.0, width],
        None => vec![0.0],
    };
    let mut visible = vec![false; points.len()];
    let mut survivors: RTree<[f64; 3]> = RTree::new();

    for (i, p) in points.iter().enumerate() {
        if p[0].is_nan() || p[1].is_nan() {
            continue;
        }
        let q = embed(*p);
        let keep = previous.get(i).copied().unwrap_or(false)
            || !shifts.iter().any(|dx| {
                let shifted = [q[0] + dx, q[1], q[2]];
                survivors
                    .locate_within_distance(shifted, radius_2)
                    .any(|s| squared_distance(s, &shifted) < radius_2)
            });
        if keep {
            visible[i] = true;
            survivors.insert(q);
        }
    }

    visible
}

fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

fn unit_vector(p: LngLat) -> [f64; 3] {
    let lng = p[0].to_radians();
    let lat = p[1].to_radians();
    [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()]
}

/// Stable key for a point collection, hashing the exact coordinate bits.
pub fn collection_key(points: &[LngLat]) -> u64 {
    let mut hasher = DefaultHasher::new();
    points.len().hash(&mut hasher);
    for p in points {
        p[0].to_bits().hash(&mut hasher);
        p[1].to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_globe_radius_halves() {
        let config = DeclutterConfig::default();
        assert_eq!(config.globe_radius_km(0), 3000.0);
        assert_eq!(config.globe_radius_km(3), 375.0);
    }

    #[test]
    fn test_config_validate() {
        assert!(DeclutterConfig::default().validate().is_ok());
        let config = DeclutterConfig {
            radius_px: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_first_of_close_pair_wins() {
        let cache = DeclutterCache::new(DeclutterConfig::default());
        let points = vec![[0.0, 0.0], [1.0, 0.0], [60.0, 0.0]];
        let mask = cache.visible(1, &points, 0.0, DeclutterMode::Globe);
        assert_eq!(*mask, vec![true, false, true]);
    }

    #[test]
    fn test_later_visible_point_does_not_suppress_earlier_candidate() {
        // candidate 0 is new at level 1, candidate 1 was visible at level 0
        let points = vec![[0.0, 0.0], [0.5, 0.0]];
        let visible = eliminate(&points, &[false, true], 1.0, None, |p| [p[0], p[1], 0.0]);
        assert_eq!(visible, vec![true, true]);
    }

    #[test]
    fn test_earlier_survivor_suppresses_new_candidate() {
        let points = vec![[0.0, 0.0], [0.5, 0.0], [0.8, 0.0]];
        let visible = eliminate(&points, &[true, false, true], 1.0, None, |p| [p[0], p[1], 0.0]);
        assert_eq!(visible, vec![true, false, true]);
    }

    #[test]
    fn test_period_wraps_x_distance() {
        let points = vec![[0.5, 0.0], [9.8, 0.0]];
        let embed = |p: LngLat| [p[0], p[1], 0.0];
        assert_eq!(eliminate(&points, &[], 1.0, None, embed), vec![true, true]);
        assert_eq!(eliminate(&points, &[], 1.0, Some(10.0), embed), vec![true, false]);
    }

    #[test]
    fn test_cache_hit() {
        let cache = DeclutterCache::new(DeclutterConfig::default());
        let points = vec![[0.0, 0.0], [10.0, 10.0]];
        let key = collection_key(&points);
        let a = cache.visible(key, &points, 4.7, DeclutterMode::Planar);
        let b = cache.visible(key, &points, 4.2, DeclutterMode::Planar);
        assert!(Arc::ptr_eq(&a, &b));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 5);

        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_collection_key_changes_with_points() {
        let a = collection_key(&[[0.0, 0.0]]);
        let b = collection_key(&[[0.0, 1e-12]]);
        assert_ne!(a, b);
        assert_eq!(a, collection_key(&[[0.0, 0.0]]));
    }
}

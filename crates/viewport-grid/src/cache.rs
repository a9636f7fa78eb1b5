//! Zoom-bucket cache of indexed globe grids.

use crate::config::GridConfig;
use crate::globe::globe_positions;
use spatial_index::SpatialIndex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Statistics for the grid cache
#[derive(Debug, Default, Clone)]
pub struct GridCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl GridCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Indexed icosphere positions per zoom bucket.
///
/// Owned by the caller. Entries are only appended; a bucket's grid never
/// changes once built, so readers share it through an `Arc`.
pub struct GridCache {
    config: GridConfig,
    buckets: RwLock<HashMap<u32, Arc<SpatialIndex>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl GridCache {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            buckets: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Index over the globe grid of `bucket`, built on first use.
    pub fn globe_index(&self, bucket: u32) -> Arc<SpatialIndex> {
        let bucket = bucket.min(self.config.max_bucket);

        if let Some(index) = self.buckets.read().ok().and_then(|b| b.get(&bucket).cloned()) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return index;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let positions = globe_positions(bucket);
        debug!(bucket = bucket, points = positions.len(), "Built globe grid");
        let index = SpatialIndex::build(positions);

        // a concurrent builder that got there first wins
        match self.buckets.write() {
            Ok(mut buckets) => buckets
                .entry(bucket)
                .or_insert_with(|| Arc::new(index))
                .clone(),
            Err(_) => Arc::new(index),
        }
    }

    /// Drop every cached bucket.
    pub fn clear(&self) {
        if let Ok(mut buckets) = self.buckets.write() {
            buckets.clear();
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> GridCacheStats {
        GridCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.buckets.read().map(|b| b.len()).unwrap_or(0),
        }
    }
}

impl Default for GridCache {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_lookup_hits() {
        let cache = GridCache::default();
        let a = cache.globe_index(1);
        let b = cache.globe_index(1);
        assert!(Arc::ptr_eq(&a, &b));

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
        assert_eq!(stats.hit_rate(), 50.0);
    }

    #[test]
    fn test_bucket_clamped_to_max() {
        let cache = GridCache::new(GridConfig {
            max_bucket: 2,
            ..Default::default()
        });
        let a = cache.globe_index(2);
        let b = cache.globe_index(6);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_clear() {
        let cache = GridCache::default();
        let a = cache.globe_index(0);
        cache.clear();
        assert_eq!(cache.stats().entries, 0);
        let b = cache.globe_index(0);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(*a.positions(), *b.positions());
    }
}

//! Background execution of contour and extremum extraction.
//!
//! Tracing a 1440x721 grid takes long enough to stall an interactive
//! caller, so the computation runs on tokio's blocking pool. The grid is
//! moved into the task and the result comes back as a flat `f64` buffer
//! (see [`crate::codec`]) that is decoded on the calling task.
//!
//! Identical requests share one computation: each key owns a
//! [`tokio::sync::OnceCell`], so concurrent callers await the same result
//! and later callers get it straight from the cell. Failed computations
//! leave the cell empty and the next request retries.

use crate::codec::{decode_contours, decode_extrema, encode_contours, encode_extrema};
use crate::config::EngineConfig;
use crate::contour::{contour_lines, ContourFeature};
use crate::extremum::{find_extrema, Extremum};
use crate::labels::{contour_labels, ContourLabel};
use field_common::{Bounds, FieldError, FieldResult, ScalarGrid};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

type Slot<T> = Arc<OnceCell<Arc<T>>>;

/// Worker statistics
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    pub hits: u64,
    pub misses: u64,
    pub failures: u64,
    pub entries: usize,
}

impl WorkerStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Runs feature extraction off the calling task and remembers results per
/// (raster, bounds, parameters).
///
/// Owned by the caller; [`clear`](Self::clear) drops the remembered results,
/// e.g. when a new forecast run replaces the rasters.
pub struct FeatureWorker {
    config: Arc<EngineConfig>,
    contours: Mutex<HashMap<String, Slot<Vec<ContourFeature>>>>,
    extrema: Mutex<HashMap<String, Slot<Vec<Extremum>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    failures: AtomicU64,
}

impl FeatureWorker {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: Arc::new(config),
            contours: Mutex::new(HashMap::new()),
            extrema: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Contour lines of `grid` every `interval` units.
    ///
    /// `raster_id` names the raster the grid came from; together with the
    /// bounds and interval it keys the shared result.
    pub async fn contours(
        &self,
        raster_id: &str,
        grid: ScalarGrid,
        bounds: Bounds,
        interval: f64,
    ) -> FieldResult<Arc<Vec<ContourFeature>>> {
        let key = format!("{}:{}:contours:{}", raster_id, bounds.cache_key(), interval);
        let config = Arc::clone(&self.config);
        self.single_flight(
            &self.contours,
            key,
            move || {
                let features = contour_lines(&grid, interval, &bounds, &config)?;
                Ok(encode_contours(&features))
            },
            decode_contours,
        )
        .await
    }

    /// Contour lines and their label anchors, placed with the configured
    /// [`LabelPlacement`](crate::config::LabelPlacement).
    ///
    /// The lines come from [`contours`](Self::contours) and share its cache;
    /// label placement runs on the calling task.
    pub async fn labelled_contours(
        &self,
        raster_id: &str,
        grid: ScalarGrid,
        bounds: Bounds,
        interval: f64,
    ) -> FieldResult<(Arc<Vec<ContourFeature>>, Vec<ContourLabel>)> {
        let features = self.contours(raster_id, grid, bounds, interval).await?;
        let labels = contour_labels(&features, &self.config.label_placement);
        Ok((features, labels))
    }

    /// Highs and lows of `grid` at least `radius_km` apart.
    pub async fn extrema(
        &self,
        raster_id: &str,
        grid: ScalarGrid,
        bounds: Bounds,
        radius_km: f64,
    ) -> FieldResult<Arc<Vec<Extremum>>> {
        let key = format!("{}:{}:extrema:{}", raster_id, bounds.cache_key(), radius_km);
        let config = Arc::clone(&self.config);
        self.single_flight(
            &self.extrema,
            key,
            move || {
                let points = find_extrema(&grid, radius_km, &bounds, &config)?;
                Ok(encode_extrema(&points))
            },
            decode_extrema,
        )
        .await
    }

    async fn single_flight<T, F, D>(
        &self,
        slots: &Mutex<HashMap<String, Slot<T>>>,
        key: String,
        compute: F,
        decode: D,
    ) -> FieldResult<Arc<T>>
    where
        F: FnOnce() -> FieldResult<Vec<f64>> + Send + 'static,
        D: FnOnce(&[f64]) -> FieldResult<T>,
    {
        let slot = {
            let mut slots = slots.lock().await;
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let computed = AtomicBool::new(false);
        let flag = &computed;
        let label = key.as_str();
        let result = slot
            .get_or_try_init(move || async move {
                flag.store(true, Ordering::Relaxed);
                debug!(key = %label, "Dispatching feature computation");
                let buffer = tokio::task::spawn_blocking(compute)
                    .await
                    .map_err(|e| FieldError::worker_failed(e.to_string()))??;
                Ok::<_, FieldError>(Arc::new(decode(&buffer)?))
            })
            .await;

        match result {
            Ok(value) => {
                if computed.load(Ordering::Relaxed) {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                }
                Ok(Arc::clone(value))
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "Feature computation failed");
                Err(e)
            }
        }
    }

    /// Drop every remembered result.
    pub async fn clear(&self) {
        self.contours.lock().await.clear();
        self.extrema.lock().await.clear();
    }

    /// Get worker statistics.
    pub async fn stats(&self) -> WorkerStats {
        let entries = self
            .contours
            .lock()
            .await
            .values()
            .filter(|s| s.initialized())
            .count()
            + self
                .extrema
                .lock()
                .await
                .values()
                .filter(|s| s.initialized())
                .count();

        WorkerStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            entries,
        }
    }
}

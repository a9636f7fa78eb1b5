//! Configuration for the feature extraction engine.

use serde::{Deserialize, Serialize};

/// Along-path cadence for contour labels.
///
/// Distances are in the line's coordinate units (degrees, used as
/// pixel-equivalents).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelPlacement {
    /// First label at `offset * repeat` from the line start.
    pub offset: f64,
    /// Distance between consecutive labels.
    pub repeat: f64,
    /// No label closer than `end_offset * repeat` to the line end.
    pub end_offset: f64,
}

impl Default for LabelPlacement {
    fn default() -> Self {
        Self {
            offset: 0.5,
            repeat: 20.0,
            end_offset: 0.25,
        }
    }
}

/// Tunables of the contour and extremum engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Apply the 3x3 box blur before tracing and extremum scanning.
    pub contour_blur: bool,

    /// Inset of the unframing clip rectangle, in pixels.
    pub unframe_epsilon: f64,

    /// Lines whose pixel bounding box is narrower than this in both axes
    /// are dropped.
    pub min_line_extent_px: u32,

    /// Number of Chaikin smoothing passes on traced lines (0 = off).
    pub smoothing_passes: u32,

    /// Value separating "real" highs from "real" lows (Pa for pressure).
    pub extremum_reference_threshold: f64,

    /// Label cadence along contour lines.
    pub label_placement: LabelPlacement,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            contour_blur: true,
            unframe_epsilon: 1e-6,
            min_line_extent_px: 4,
            smoothing_passes: 0,
            extremum_reference_threshold: 100_000.0,
            label_placement: LabelPlacement::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CONTOUR_BLUR") {
            config.contour_blur = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("CONTOUR_UNFRAME_EPSILON") {
            if let Ok(eps) = val.parse() {
                config.unframe_epsilon = eps;
            }
        }

        if let Ok(val) = std::env::var("CONTOUR_MIN_LINE_EXTENT") {
            if let Ok(extent) = val.parse() {
                config.min_line_extent_px = extent;
            }
        }

        if let Ok(val) = std::env::var("CONTOUR_SMOOTHING_PASSES") {
            if let Ok(passes) = val.parse() {
                config.smoothing_passes = passes;
            }
        }

        if let Ok(val) = std::env::var("EXTREMUM_REFERENCE_THRESHOLD") {
            if let Ok(threshold) = val.parse() {
                config.extremum_reference_threshold = threshold;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.unframe_epsilon >= 0.0 && self.unframe_epsilon < 0.5) {
            return Err("unframe_epsilon must be in [0, 0.5)".to_string());
        }

        if self.smoothing_passes > 8 {
            return Err("smoothing_passes must be <= 8".to_string());
        }

        if self.extremum_reference_threshold.is_nan() {
            return Err("extremum_reference_threshold must be a number".to_string());
        }

        let placement = &self.label_placement;
        if !(placement.repeat > 0.0) {
            return Err("label_placement.repeat must be > 0".to_string());
        }
        if placement.offset < 0.0 || placement.end_offset < 0.0 {
            return Err("label_placement offsets must be >= 0".to_string());
        }

        Ok(())
    }
}

//! Derived per-point samples.

use crate::bounds::LngLat;
use serde::{Deserialize, Serialize};

/// Magnitude and direction derived at one query point.
///
/// A NaN `value` means "no data" and must propagate through consumers.
/// `direction` is NaN for scalar fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: f64,
    pub direction: f64,
}

impl Sample {
    /// The "no value" sample.
    pub const NO_DATA: Sample = Sample {
        value: f64::NAN,
        direction: f64::NAN,
    };

    pub fn has_value(&self) -> bool {
        !self.value.is_nan()
    }
}

/// A grid position paired with its sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSample {
    pub position: LngLat,
    pub sample: Sample,
}

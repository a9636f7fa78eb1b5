//! Feature extraction from gridded geophysical fields.
//!
//! Implements:
//! - Pixel sampling with smoothing and time blending ([`sampler`])
//! - Contour lines via framed marching squares ([`contour`])
//! - Contour label anchors ([`labels`])
//! - High/low detection with proximity suppression ([`extremum`])
//! - A background worker with single-flight result sharing ([`worker`])

pub mod blur;
pub mod clip;
pub mod codec;
pub mod config;
pub mod contour;
pub mod extremum;
pub mod isolines;
pub mod labels;
pub mod sampler;
pub mod worker;

pub use config::{EngineConfig, LabelPlacement};
pub use contour::{contour_lines, generate_thresholds, ContourFeature};
pub use extremum::{find_extrema, Extremum, ExtremumKind};
pub use labels::{contour_labels, ContourLabel};
pub use sampler::{sample, FieldSampler, Interpolation};
pub use worker::{FeatureWorker, WorkerStats};

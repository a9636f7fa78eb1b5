//! Error types for field feature extraction.

use thiserror::Error;

/// Result type alias using FieldError.
pub type FieldResult<T> = Result<T, FieldError>;

/// Primary error type for raster decoding and feature computation.
///
/// Only a malformed raster aborts a computation. Nodata and out-of-range
/// look-ups resolve to NaN and never surface here.
#[derive(Debug, Error)]
pub enum FieldError {
    // === Raster format errors ===
    #[error("Unsupported raster format: {0}")]
    InvalidFormat(String),

    #[error("Quantized raster requires an unscale range")]
    MissingUnscaleRange,

    #[error("Raster buffer length {len} is not a multiple of {width}x{height}")]
    DimensionMismatch { len: usize, width: u32, height: u32 },

    // === Parameter errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Worker boundary errors ===
    #[error("Background computation failed: {0}")]
    WorkerFailed(String),

    #[error("Malformed result buffer: {0}")]
    MalformedBuffer(String),
}

impl FieldError {
    /// Create an InvalidFormat error.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a WorkerFailed error.
    pub fn worker_failed(msg: impl Into<String>) -> Self {
        Self::WorkerFailed(msg.into())
    }

    /// Whether the error came from a malformed input raster rather than
    /// from the computation boundary. Only these should abort a render.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            FieldError::InvalidFormat(_)
                | FieldError::MissingUnscaleRange
                | FieldError::DimensionMismatch { .. }
        )
    }
}

//! Band-layout resolution and per-pixel value decoding.
//!
//! The raster layout (quantized/physical × scalar/vector) is resolved once
//! into a [`FieldDecoder`]; every per-pixel operation then dispatches on
//! that enum instead of re-inspecting the raster.

use crate::error::{FieldError, FieldResult};
use crate::raster::{FieldKind, Raster, RasterKind, ScalarGrid, UnscaleRange, VALID_ALPHA};
use crate::sample::Sample;

/// Decoder for the pixel bands of one raster layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDecoder {
    /// Band 0 is the value, `alpha` is the index of the validity band.
    QuantizedScalar { range: UnscaleRange, alpha: usize },
    /// Bands 0/1 are u/v, `alpha` is the index of the validity band.
    QuantizedVector { range: UnscaleRange, alpha: usize },
    /// Band 0 is the value, NaN is nodata.
    PhysicalScalar,
    /// Bands 0/1 are u/v, NaN in band 0 is nodata.
    PhysicalVector,
}

impl FieldDecoder {
    /// Resolve the decoder for a raster.
    ///
    /// Fails fast when the band count matches no supported combination:
    ///
    /// | raster    | scalar | vector |
    /// |-----------|--------|--------|
    /// | quantized | 2, 4   | 3, 4   |
    /// | physical  | 1      | 2      |
    pub fn resolve(
        raster: &Raster,
        kind: FieldKind,
        unscale: Option<UnscaleRange>,
    ) -> FieldResult<Self> {
        Self::for_layout(raster.kind(), raster.band_count(), kind, unscale)
    }

    /// Resolve the decoder from a layout description.
    pub fn for_layout(
        raster_kind: RasterKind,
        band_count: usize,
        kind: FieldKind,
        unscale: Option<UnscaleRange>,
    ) -> FieldResult<Self> {
        match (raster_kind, kind, band_count) {
            (RasterKind::Quantized, FieldKind::Scalar, 2 | 4) => Ok(Self::QuantizedScalar {
                range: unscale.ok_or(FieldError::MissingUnscaleRange)?,
                alpha: band_count - 1,
            }),
            (RasterKind::Quantized, FieldKind::Vector, 3 | 4) => Ok(Self::QuantizedVector {
                range: unscale.ok_or(FieldError::MissingUnscaleRange)?,
                alpha: band_count - 1,
            }),
            (RasterKind::Physical, FieldKind::Scalar, 1) => Ok(Self::PhysicalScalar),
            (RasterKind::Physical, FieldKind::Vector, 2) => Ok(Self::PhysicalVector),
            _ => Err(FieldError::invalid_format(format!(
                "{:?} {:?} field with {} bands",
                raster_kind, kind, band_count
            ))),
        }
    }

    pub fn field_kind(&self) -> FieldKind {
        match self {
            Self::QuantizedScalar { .. } | Self::PhysicalScalar => FieldKind::Scalar,
            Self::QuantizedVector { .. } | Self::PhysicalVector => FieldKind::Vector,
        }
    }

    /// Whether the pixel carries data.
    ///
    /// Quantized: the validity band equals 255. Physical: band 0 is not NaN.
    pub fn has_value(&self, bands: &[f64]) -> bool {
        match self {
            Self::QuantizedScalar { alpha, .. } | Self::QuantizedVector { alpha, .. } => {
                bands.get(*alpha).copied() == Some(VALID_ALPHA)
            }
            Self::PhysicalScalar | Self::PhysicalVector => {
                bands.first().map_or(false, |v| !v.is_nan())
            }
        }
    }

    /// Physical value of band `index`, NaN when missing.
    fn band(&self, bands: &[f64], index: usize) -> f64 {
        let raw = bands.get(index).copied().unwrap_or(f64::NAN);
        match self {
            Self::QuantizedScalar { range, .. } | Self::QuantizedVector { range, .. } => {
                range.unscale(raw)
            }
            Self::PhysicalScalar | Self::PhysicalVector => raw,
        }
    }

    /// Unscaled first band, NaN when the pixel has no value.
    pub fn scalar_value(&self, bands: &[f64]) -> f64 {
        if !self.has_value(bands) {
            return f64::NAN;
        }
        self.band(bands, 0)
    }

    /// Unscaled (u, v) components. Scalar fields yield `(value, NaN)`.
    pub fn vector_value(&self, bands: &[f64]) -> (f64, f64) {
        if !self.has_value(bands) {
            return (f64::NAN, f64::NAN);
        }
        match self.field_kind() {
            FieldKind::Scalar => (self.band(bands, 0), f64::NAN),
            FieldKind::Vector => (self.band(bands, 0), self.band(bands, 1)),
        }
    }

    /// Scalar value, or the Euclidean norm of the vector components.
    pub fn magnitude(&self, bands: &[f64]) -> f64 {
        match self.field_kind() {
            FieldKind::Scalar => self.scalar_value(bands),
            FieldKind::Vector => {
                let (u, v) = self.vector_value(bands);
                u.hypot(v)
            }
        }
    }

    /// Compass direction in `[0, 360)` (0 = N, 90 = E) for vector fields,
    /// NaN for scalar fields and missing pixels.
    pub fn direction(&self, bands: &[f64]) -> f64 {
        match self.field_kind() {
            FieldKind::Scalar => f64::NAN,
            FieldKind::Vector => {
                let (u, v) = self.vector_value(bands);
                vector_direction(u, v)
            }
        }
    }

    /// Magnitude and direction of one pixel.
    pub fn sample(&self, bands: &[f64]) -> Sample {
        Sample {
            value: self.magnitude(bands),
            direction: self.direction(bands),
        }
    }

    /// Magnitude of every raster pixel as a grid, NaN where invalid.
    pub fn magnitude_grid(&self, raster: &Raster) -> ScalarGrid {
        let width = raster.width() as usize;
        let height = raster.height() as usize;
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(self.magnitude(raster.pixel(x, y).as_slice()));
            }
        }
        ScalarGrid {
            width,
            height,
            data,
        }
    }
}

/// Bearing of a (u, v) vector: `((360 - (atan2(v, u)° + 180)) - 270) mod 360`.
pub fn vector_direction(u: f64, v: f64) -> f64 {
    let math_deg = v.atan2(u).to_degrees();
    let bearing = ((360.0 - (math_deg + 180.0)) - 270.0).rem_euclid(360.0);
    // rem_euclid can round up to the modulus for tiny negative inputs
    if bearing >= 360.0 {
        bearing - 360.0
    } else {
        bearing
    }
}

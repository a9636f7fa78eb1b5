//! Raster model: typed band buffers, field kinds and the scalar grid.

use crate::error::{FieldError, FieldResult};
use serde::{Deserialize, Serialize};

/// Largest band count a raster may carry (RGBA).
pub const MAX_BANDS: usize = 4;

/// Alpha value marking a valid quantized pixel.
pub const VALID_ALPHA: f64 = 255.0;

/// How the bands of a raster encode physical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterKind {
    /// Unsigned byte bands (0-255); the last band is an alpha/validity mask.
    Quantized,
    /// Floating-point bands; invalid cells are NaN.
    Physical,
}

/// Number of meaningful bands in a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// One measured quantity.
    Scalar,
    /// Two orthogonal components (u, v); magnitude and direction are derived.
    Vector,
}

/// Physical range a quantized band maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnscaleRange {
    pub min: f64,
    pub max: f64,
}

impl UnscaleRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Map a band value in `[0, 255]` linearly onto `[min, max]`.
    ///
    /// Written as a two-sided lerp so that 0 and 255 return `min` and `max`
    /// exactly.
    pub fn unscale(&self, band: f64) -> f64 {
        let t = band / 255.0;
        self.min * (1.0 - t) + self.max * t
    }
}

/// Band buffer of a raster, row-major and band-interleaved.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterData {
    Quantized(Vec<u8>),
    Physical(Vec<f32>),
}

impl RasterData {
    pub fn len(&self) -> usize {
        match self {
            RasterData::Quantized(d) => d.len(),
            RasterData::Physical(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded raster image covering some geographic bounds.
///
/// Immutable once built. `data.len() == width * height * band_count`.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    band_count: usize,
    data: RasterData,
}

impl Raster {
    /// Build a raster, checking that the buffer holds a whole number of
    /// bands per pixel.
    pub fn new(data: RasterData, width: u32, height: u32) -> FieldResult<Self> {
        let pixels = width as usize * height as usize;
        if pixels == 0 || data.len() % pixels != 0 {
            return Err(FieldError::DimensionMismatch {
                len: data.len(),
                width,
                height,
            });
        }

        let band_count = data.len() / pixels;
        if band_count == 0 || band_count > MAX_BANDS {
            return Err(FieldError::invalid_format(format!(
                "{} bands per pixel, expected 1 to {}",
                band_count, MAX_BANDS
            )));
        }

        Ok(Self {
            width,
            height,
            band_count,
            data,
        })
    }

    /// Byte-quantized raster (last band is alpha).
    pub fn quantized(data: Vec<u8>, width: u32, height: u32) -> FieldResult<Self> {
        Self::new(RasterData::Quantized(data), width, height)
    }

    /// Floating-point raster (nodata already applied as NaN).
    pub fn physical(data: Vec<f32>, width: u32, height: u32) -> FieldResult<Self> {
        Self::new(RasterData::Physical(data), width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn band_count(&self) -> usize {
        self.band_count
    }

    pub fn kind(&self) -> RasterKind {
        match self.data {
            RasterData::Quantized(_) => RasterKind::Quantized,
            RasterData::Physical(_) => RasterKind::Physical,
        }
    }

    pub fn data(&self) -> &RasterData {
        &self.data
    }

    /// Band values of the pixel at column `x`, row `y`.
    ///
    /// Coordinates must be inside the raster.
    pub fn pixel(&self, x: usize, y: usize) -> PixelBands {
        let start = (y * self.width as usize + x) * self.band_count;
        let mut bands = PixelBands::empty(self.band_count);
        match &self.data {
            RasterData::Quantized(d) => {
                for (slot, &v) in bands.values.iter_mut().zip(&d[start..start + self.band_count]) {
                    *slot = v as f64;
                }
            }
            RasterData::Physical(d) => {
                for (slot, &v) in bands.values.iter_mut().zip(&d[start..start + self.band_count]) {
                    *slot = v as f64;
                }
            }
        }
        bands
    }
}

/// The band values of one (possibly filtered) pixel.
///
/// Quantized bands stay in the 0-255 domain here; unscaling happens in the
/// decoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBands {
    values: [f64; MAX_BANDS],
    len: usize,
}

impl PixelBands {
    /// `len` zero-valued bands.
    pub fn empty(len: usize) -> Self {
        Self {
            values: [0.0; MAX_BANDS],
            len: len.min(MAX_BANDS),
        }
    }

    /// Copy up to four bands from a slice.
    pub fn from_slice(bands: &[f64]) -> Self {
        let mut out = Self::empty(bands.len());
        out.values[..out.len].copy_from_slice(&bands[..out.len]);
        out
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values[..self.len]
    }

    /// Band-wise `a + (b - a) * t`; equal inputs stay bit-identical.
    pub fn lerp(a: &PixelBands, b: &PixelBands, t: f64) -> PixelBands {
        let mut out = *a;
        for (o, &bv) in out.as_mut_slice().iter_mut().zip(b.as_slice()) {
            *o += (bv - *o) * t;
        }
        out
    }

    /// Band-wise weighted sum `Σ w_i * p_i`.
    pub fn weighted_sum(pixels: &[PixelBands], weights: &[f64]) -> PixelBands {
        let len = pixels.first().map(|p| p.len).unwrap_or(0);
        let mut out = PixelBands::empty(len);
        for (p, &w) in pixels.iter().zip(weights) {
            for (o, &v) in out.as_mut_slice().iter_mut().zip(p.as_slice()) {
                *o += v * w;
            }
        }
        out
    }
}

impl std::ops::Index<usize> for PixelBands {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.as_slice()[index]
    }
}

/// A single-band f64 grid, row-major, NaN where there is no data.
///
/// This is the magnitude grid consumed by contour tracing and extremum
/// detection.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarGrid {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
}

impl ScalarGrid {
    pub fn new(data: Vec<f64>, width: usize, height: usize) -> FieldResult<Self> {
        let grid = Self { width, height, data };
        grid.check_dimensions()?;
        Ok(grid)
    }

    /// Fails when `data` does not hold exactly `width * height` cells.
    ///
    /// The fields are public, so consumers call this before indexing a
    /// grid they did not build through [`ScalarGrid::new`].
    pub fn check_dimensions(&self) -> FieldResult<()> {
        if self.data.len() != self.width * self.height {
            return Err(FieldError::DimensionMismatch {
                len: self.data.len(),
                width: self.width as u32,
                height: self.height as u32,
            });
        }
        Ok(())
    }

    /// Value at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    /// Minimum and maximum over non-NaN cells, `None` when every cell is NaN.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for &v in self.data.iter().filter(|v| !v.is_nan()) {
            range = Some(match range {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
        range
    }

    /// Number of non-NaN cells.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscale_endpoints_exact() {
        let range = UnscaleRange::new(-0.1, 87.3);
        assert_eq!(range.unscale(0.0), -0.1);
        assert_eq!(range.unscale(255.0), 87.3);
    }

    #[test]
    fn test_raster_band_count() {
        let r = Raster::quantized(vec![0; 4 * 3 * 2], 3, 2).unwrap();
        assert_eq!(r.band_count(), 4);
        assert_eq!(r.kind(), RasterKind::Quantized);

        let r = Raster::physical(vec![0.0; 6], 3, 2).unwrap();
        assert_eq!(r.band_count(), 1);
        assert_eq!(r.kind(), RasterKind::Physical);
    }

    #[test]
    fn test_raster_rejects_ragged_buffer() {
        assert!(matches!(
            Raster::quantized(vec![0; 7], 3, 2),
            Err(FieldError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            Raster::physical(vec![0.0; 30], 3, 2),
            Err(FieldError::InvalidFormat(_))
        ));
        assert!(Raster::physical(vec![], 0, 0).is_err());
    }

    #[test]
    fn test_pixel_read() {
        let data: Vec<u8> = (0..12).collect();
        let r = Raster::quantized(data, 3, 2).unwrap();
        let p = r.pixel(1, 1);
        assert_eq!(p.as_slice(), &[8.0, 9.0]);
    }

    #[test]
    fn test_lerp_keeps_equal_bands() {
        let a = PixelBands::from_slice(&[255.0, 1.5]);
        let b = PixelBands::from_slice(&[255.0, 3.5]);
        let m = PixelBands::lerp(&a, &b, 0.37);
        assert_eq!(m[0], 255.0);
        assert!((m[1] - 2.24).abs() < 1e-12);
    }

    #[test]
    fn test_scalar_grid_min_max() {
        let g = ScalarGrid::new(vec![f64::NAN, 3.0, -1.0, 7.0], 2, 2).unwrap();
        assert_eq!(g.min_max(), Some((-1.0, 7.0)));
        assert_eq!(g.valid_count(), 3);

        let empty = ScalarGrid::new(vec![f64::NAN; 4], 2, 2).unwrap();
        assert_eq!(empty.min_max(), None);
    }
}

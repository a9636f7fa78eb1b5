//! Raster pixel sampling with smoothing and temporal blending.
//!
//! Texture-style filtering in normalized `(u, v)` coordinates: `u` runs
//! 0..1 west to east over the raster, `v` 0..1 north to south, and texel
//! centres sit at `(i + 0.5) / width`.
//!
//! Smoothing does not blur the raster. It shrinks the grid the filter runs
//! against to `(width, height) / (1 + smoothing)`, so each filter tap spans
//! several source pixels and the result softens as smoothing grows.

use field_common::raster::VALID_ALPHA;
use field_common::{
    Bounds, FieldDecoder, FieldError, FieldKind, FieldResult, GridSample, LngLat, PixelBands,
    Raster, RasterKind, Sample, ScalarGrid, UnscaleRange,
};
use projection::{wrap_longitude, GridTransform};
use serde::{Deserialize, Serialize};

/// Resampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    /// Closest downscaled cell.
    Nearest,
    /// 2x2 bilinear blend.
    Linear,
    /// 4x4 cubic B-spline, applied in X then Y.
    Cubic,
}

impl Default for Interpolation {
    fn default() -> Self {
        Self::Linear
    }
}

impl Interpolation {
    /// Parse from string (case-insensitive), defaulting to linear.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "nearest" => Self::Nearest,
            "cubic" | "bicubic" => Self::Cubic,
            _ => Self::Linear,
        }
    }
}

/// Effective filter grid for a raster and smoothing factor.
pub fn downscale_resolution(image: &Raster, smoothing: f64) -> [f64; 2] {
    let factor = 1.0 + smoothing.max(0.0);
    [image.width() as f64 / factor, image.height() as f64 / factor]
}

/// Sample an image, optionally blended toward a second time slice.
///
/// `image2` is only read when present and `weight > 0`; at `weight >= 1`
/// only `image2` is read. Both images must share a band layout.
pub fn sample(
    image: &Raster,
    image2: Option<&Raster>,
    smoothing: f64,
    interpolation: Interpolation,
    weight: f64,
    uv_x: f64,
    uv_y: f64,
) -> PixelBands {
    match image2 {
        Some(next) if weight >= 1.0 => filter(next, smoothing, interpolation, uv_x, uv_y),
        Some(next) if weight > 0.0 => {
            let a = filter(image, smoothing, interpolation, uv_x, uv_y);
            let b = filter(next, smoothing, interpolation, uv_x, uv_y);
            PixelBands::lerp(&a, &b, weight)
        }
        _ => filter(image, smoothing, interpolation, uv_x, uv_y),
    }
}

fn filter(
    image: &Raster,
    smoothing: f64,
    interpolation: Interpolation,
    uv_x: f64,
    uv_y: f64,
) -> PixelBands {
    let resolution = downscale_resolution(image, smoothing);
    match interpolation {
        Interpolation::Nearest => sample_nearest(image, resolution, uv_x, uv_y),
        Interpolation::Linear => sample_linear(image, resolution, uv_x, uv_y),
        Interpolation::Cubic => sample_cubic(image, resolution, uv_x, uv_y),
    }
}

/// Raw raster pixel under downscaled cell `(ix, iy)`, edges clamped.
fn texel(image: &Raster, resolution: [f64; 2], ix: f64, iy: f64) -> PixelBands {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let u = (ix + 0.5) / resolution[0];
    let v = (iy + 0.5) / resolution[1];
    let x = clamp_index((u * width as f64).floor(), width);
    let y = clamp_index((v * height as f64).floor(), height);
    image.pixel(x, y)
}

fn clamp_index(value: f64, len: usize) -> usize {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        (value as usize).min(len - 1)
    }
}

fn sample_nearest(image: &Raster, resolution: [f64; 2], uv_x: f64, uv_y: f64) -> PixelBands {
    // round(uv * res - 0.5) with halves rounding up
    let ix = (uv_x * resolution[0]).floor();
    let iy = (uv_y * resolution[1]).floor();
    texel(image, resolution, ix, iy)
}

fn sample_linear(image: &Raster, resolution: [f64; 2], uv_x: f64, uv_y: f64) -> PixelBands {
    let px = uv_x * resolution[0] - 0.5;
    let py = uv_y * resolution[1] - 0.5;
    let (ix, iy) = (px.floor(), py.floor());
    let (fx, fy) = (px - ix, py - iy);

    let top = PixelBands::lerp(
        &texel(image, resolution, ix, iy),
        &texel(image, resolution, ix + 1.0, iy),
        fx,
    );
    let bottom = PixelBands::lerp(
        &texel(image, resolution, ix, iy + 1.0),
        &texel(image, resolution, ix + 1.0, iy + 1.0),
        fx,
    );
    PixelBands::lerp(&top, &bottom, fy)
}

/// Cubic B-spline weights for taps at offsets -1, 0, 1, 2.
///
/// `A = [3, -6, 0, 4] / 6` covers `|t| < 1`, `B = [-1, 6, -12, 8] / 6`
/// covers `1 <= |t| < 2`; both are evaluated on the powers `[t³, t², t, 1]`.
fn cubic_weights(f: f64) -> [f64; 4] {
    const A: [f64; 4] = [3.0 / 6.0, -6.0 / 6.0, 0.0, 4.0 / 6.0];
    const B: [f64; 4] = [-1.0 / 6.0, 6.0 / 6.0, -12.0 / 6.0, 8.0 / 6.0];
    let poly = |c: &[f64; 4], t: f64| ((c[0] * t + c[1]) * t + c[2]) * t + c[3];
    [poly(&B, 1.0 + f), poly(&A, f), poly(&A, 1.0 - f), poly(&B, 2.0 - f)]
}

fn sample_cubic(image: &Raster, resolution: [f64; 2], uv_x: f64, uv_y: f64) -> PixelBands {
    let px = uv_x * resolution[0] - 0.5;
    let py = uv_y * resolution[1] - 0.5;
    let (ix, iy) = (px.floor(), py.floor());
    let wx = cubic_weights(px - ix);
    let wy = cubic_weights(py - iy);

    let mut all_valid = true;
    let mut rows = [PixelBands::empty(image.band_count()); 4];
    for (row, dy) in rows.iter_mut().zip(-1..=2) {
        let mut taps = [PixelBands::empty(image.band_count()); 4];
        for (tap, dx) in taps.iter_mut().zip(-1..=2) {
            *tap = texel(image, resolution, ix + dx as f64, iy + dy as f64);
            all_valid &= texel_is_valid(image.kind(), tap);
        }
        *row = PixelBands::weighted_sum(&taps, &wx);
    }
    let mut out = PixelBands::weighted_sum(&rows, &wy);

    // a partially valid footprint would otherwise bleed a halo past data edges
    match image.kind() {
        RasterKind::Quantized => {
            let alpha = out.len() - 1;
            out.as_mut_slice()[alpha] = if all_valid { VALID_ALPHA } else { 0.0 };
        }
        RasterKind::Physical => {
            if !all_valid {
                out.as_mut_slice().iter_mut().for_each(|v| *v = f64::NAN);
            }
        }
    }
    out
}

fn texel_is_valid(kind: RasterKind, bands: &PixelBands) -> bool {
    match kind {
        RasterKind::Quantized => bands.as_slice().last().copied() == Some(VALID_ALPHA),
        RasterKind::Physical => bands.as_slice().first().map_or(false, |v| !v.is_nan()),
    }
}

/// Geographic sampler over one raster (and an optional next time slice).
#[derive(Debug, Clone)]
pub struct FieldSampler<'a> {
    image: &'a Raster,
    image2: Option<&'a Raster>,
    transform: GridTransform,
    decoder: FieldDecoder,
    pub smoothing: f64,
    pub interpolation: Interpolation,
    pub weight: f64,
}

impl<'a> FieldSampler<'a> {
    /// Resolve the field layout once. Fails when the band layout is
    /// unsupported or the two images disagree on it.
    pub fn new(
        image: &'a Raster,
        image2: Option<&'a Raster>,
        bounds: Bounds,
        kind: FieldKind,
        unscale: Option<UnscaleRange>,
    ) -> FieldResult<Self> {
        let decoder = FieldDecoder::resolve(image, kind, unscale)?;
        if let Some(next) = image2 {
            if next.kind() != image.kind() || next.band_count() != image.band_count() {
                return Err(FieldError::invalid_format(format!(
                    "time slices differ: {:?}/{} bands vs {:?}/{} bands",
                    image.kind(),
                    image.band_count(),
                    next.kind(),
                    next.band_count()
                )));
            }
        }

        Ok(Self {
            image,
            image2,
            transform: GridTransform::new(image.width() as usize, image.height() as usize, bounds),
            decoder,
            smoothing: 0.0,
            interpolation: Interpolation::default(),
            weight: 0.0,
        })
    }

    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = smoothing.max(0.0);
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight.clamp(0.0, 1.0);
        self
    }

    pub fn decoder(&self) -> &FieldDecoder {
        &self.decoder
    }

    pub fn bounds(&self) -> &Bounds {
        &self.transform.bounds
    }

    /// Filtered band values at normalized texture coordinates.
    pub fn sample_uv(&self, uv_x: f64, uv_y: f64) -> PixelBands {
        sample(
            self.image,
            self.image2,
            self.smoothing,
            self.interpolation,
            self.weight,
            uv_x,
            uv_y,
        )
    }

    /// Magnitude and direction at a geographic position.
    ///
    /// Positions outside the raster bounds give [`Sample::NO_DATA`].
    pub fn sample_at(&self, position: LngLat) -> Sample {
        let bounds = &self.transform.bounds;
        let lng = wrap_longitude(position[0], Some(bounds.min_lng));
        if !bounds.contains([lng, position[1]]) {
            return Sample::NO_DATA;
        }

        let [x, y] = self.transform.project([lng, position[1]]);
        let resolution = downscale_resolution(self.image, self.smoothing);
        // Horizontal half-cell of the downscaled grid, kept as observed.
        let uv_x = x / self.transform.width as f64 + 0.5 / resolution[0];
        let uv_y = (y + 0.5) / self.transform.height as f64;

        let bands = self.sample_uv(uv_x, uv_y);
        self.decoder.sample(bands.as_slice())
    }

    /// Pair every position with its sample.
    pub fn sample_points(&self, positions: &[LngLat]) -> Vec<GridSample> {
        positions
            .iter()
            .map(|&position| GridSample {
                position,
                sample: self.sample_at(position),
            })
            .collect()
    }

    /// Magnitude grid at the raster resolution, filtered through the
    /// sampler's smoothing, interpolation and time blend.
    ///
    /// Without smoothing or blending this is the raw per-pixel magnitude.
    pub fn magnitude_grid(&self) -> ScalarGrid {
        let raw = self.smoothing == 0.0 && (self.image2.is_none() || self.weight == 0.0);
        if raw {
            return self.decoder.magnitude_grid(self.image);
        }

        let width = self.image.width() as usize;
        let height = self.image.height() as usize;
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let uv_x = (x as f64 + 0.5) / width as f64;
                let uv_y = (y as f64 + 0.5) / height as f64;
                data.push(self.decoder.magnitude(self.sample_uv(uv_x, uv_y).as_slice()));
            }
        }
        ScalarGrid {
            width,
            height,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_raster(width: u32, height: u32) -> Raster {
        let data = (0..height)
            .flat_map(|_| (0..width).map(|x| x as f32))
            .collect();
        Raster::physical(data, width, height).unwrap()
    }

    #[test]
    fn test_cubic_weights_sum_to_one() {
        for i in 0..=10 {
            let w = cubic_weights(i as f64 / 10.0);
            assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            assert!(w.iter().all(|&x| x >= 0.0));
        }
        let w = cubic_weights(0.0);
        assert!((w[0] - 1.0 / 6.0).abs() < 1e-12);
        assert!((w[1] - 4.0 / 6.0).abs() < 1e-12);
        assert!((w[2] - 1.0 / 6.0).abs() < 1e-12);
        assert!(w[3].abs() < 1e-12);
    }

    #[test]
    fn test_linear_midpoint() {
        let image = ramp_raster(4, 1);
        // halfway between texel centres 1 and 2
        let p = sample(&image, None, 0.0, Interpolation::Linear, 0.0, 2.0 / 4.0, 0.5);
        assert!((p[0] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_edges_clamp() {
        let image = ramp_raster(4, 1);
        let p = sample(&image, None, 0.0, Interpolation::Linear, 0.0, -0.5, 0.5);
        assert_eq!(p[0], 0.0);
        let p = sample(&image, None, 0.0, Interpolation::Nearest, 0.0, 1.7, 0.5);
        assert_eq!(p[0], 3.0);
    }

    #[test]
    fn test_smoothing_coarsens_nearest() {
        let image = ramp_raster(8, 1);
        // smoothing 1 halves the grid: each downscaled cell covers two texels
        let a = sample(&image, None, 1.0, Interpolation::Nearest, 0.0, 0.30, 0.5);
        let b = sample(&image, None, 1.0, Interpolation::Nearest, 0.0, 0.45, 0.5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cubic_invalid_footprint_quantized() {
        // 5x5 byte raster with one transparent pixel
        let mut data = vec![];
        for i in 0..25 {
            data.extend_from_slice(&[100, if i == 12 { 0 } else { 255 }]);
        }
        let image = Raster::quantized(data, 5, 5).unwrap();
        let near = sample(&image, None, 0.0, Interpolation::Cubic, 0.0, 0.5, 0.5);
        assert_eq!(near[1], 0.0);
        let far = sample(&image, None, 0.0, Interpolation::Cubic, 0.0, 0.01, 0.01);
        assert_eq!(far[1], 255.0);
        assert!((far[0] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation_from_str() {
        assert_eq!(Interpolation::from_str("NEAREST"), Interpolation::Nearest);
        assert_eq!(Interpolation::from_str("bicubic"), Interpolation::Cubic);
        assert_eq!(Interpolation::from_str("other"), Interpolation::Linear);
    }
}

//! Test data generators for creating synthetic field data.
//!
//! These generators create predictable, verifiable patterns (ramps, peaks,
//! wells) that can be used across the test suite. Grids are row-major
//! `Vec<f64>`; quantized helpers produce interleaved byte bands with a
//! trailing alpha band.

/// Creates a horizontal ramp where each cell value equals its column index.
///
/// # Example
///
/// ```
/// use test_utils::linear_ramp;
///
/// let grid = linear_ramp(100, 3);
/// assert_eq!(grid.len(), 300);
/// assert_eq!(grid[0], 0.0);
/// assert_eq!(grid[99], 99.0);
/// assert_eq!(grid[100], 0.0);
/// ```
pub fn linear_ramp(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(col as f64);
        }
    }
    data
}

/// Creates a constant grid.
pub fn constant_grid(width: usize, height: usize, value: f64) -> Vec<f64> {
    vec![value; width * height]
}

/// A Gaussian bump added to a flat base.
#[derive(Debug, Clone, Copy)]
pub struct Bump {
    /// Column of the bump centre
    pub x: f64,
    /// Row of the bump centre
    pub y: f64,
    /// Standard deviation in cells
    pub sigma: f64,
    /// Peak height above (or depth below, when negative) the base
    pub amplitude: f64,
}

/// Creates a grid from a base value plus a sum of Gaussian bumps.
pub fn bumps_grid(width: usize, height: usize, base: f64, bumps: &[Bump]) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let mut value = base;
            for b in bumps {
                let dx = col as f64 - b.x;
                let dy = row as f64 - b.y;
                value += b.amplitude * (-(dx * dx + dy * dy) / (2.0 * b.sigma * b.sigma)).exp();
            }
            data.push(value);
        }
    }
    data
}

/// Creates a single Gaussian peak centred at `(cx, cy)`.
///
/// Values decrease strictly with distance from the centre, so the grid has
/// exactly one local maximum and no interior minimum.
pub fn gaussian_peak(
    width: usize,
    height: usize,
    cx: f64,
    cy: f64,
    sigma: f64,
    base: f64,
    amplitude: f64,
) -> Vec<f64> {
    bumps_grid(
        width,
        height,
        base,
        &[Bump {
            x: cx,
            y: cy,
            sigma,
            amplitude,
        }],
    )
}

/// Creates two identical peaks on the same row, `separation` columns apart,
/// centred in the grid.
pub fn twin_peaks(
    width: usize,
    height: usize,
    separation: f64,
    sigma: f64,
    base: f64,
    amplitude: f64,
) -> Vec<f64> {
    let cx = width as f64 / 2.0;
    let cy = (height / 2) as f64;
    bumps_grid(
        width,
        height,
        base,
        &[
            Bump {
                x: (cx - separation / 2.0).round(),
                y: cy,
                sigma,
                amplitude,
            },
            Bump {
                x: (cx - separation / 2.0).round() + separation.round(),
                y: cy,
                sigma,
                amplitude,
            },
        ],
    )
}

/// Sets the given cells to NaN.
pub fn with_nans(mut data: Vec<f64>, width: usize, cells: &[(usize, usize)]) -> Vec<f64> {
    for &(x, y) in cells {
        data[y * width + x] = f64::NAN;
    }
    data
}

/// Quantizes a scalar grid into interleaved `[value, alpha]` bytes.
///
/// NaN cells get alpha 0, everything else alpha 255. Values are mapped
/// from `[min, max]` onto `[0, 255]` and rounded.
pub fn quantized_scalar_raster(values: &[f64], min: f64, max: f64) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 2);
    for &v in values {
        if v.is_nan() {
            out.extend_from_slice(&[0, 0]);
        } else {
            out.extend_from_slice(&[quantize(v, min, max), 255]);
        }
    }
    out
}

/// Quantizes u/v grids into interleaved `[u, v, 0, alpha]` RGBA bytes.
pub fn quantized_vector_raster(u: &[f64], v: &[f64], min: f64, max: f64) -> Vec<u8> {
    let mut out = Vec::with_capacity(u.len() * 4);
    for (&a, &b) in u.iter().zip(v) {
        if a.is_nan() || b.is_nan() {
            out.extend_from_slice(&[0, 0, 0, 0]);
        } else {
            out.extend_from_slice(&[quantize(a, min, max), quantize(b, min, max), 0, 255]);
        }
    }
    out
}

fn quantize(value: f64, min: f64, max: f64) -> u8 {
    ((value - min) / (max - min) * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Converts a grid to the f32 buffer of a physical raster.
pub fn to_f32(values: &[f64]) -> Vec<f32> {
    values.iter().map(|&v| v as f32).collect()
}

//! Integration tests for pixel sampling and the geographic sampler.

use feature_extract::{
    contour_lines, find_extrema, sample, EngineConfig, ExtremumKind, FieldSampler, Interpolation,
};
use field_common::{Bounds, FieldDecoder, FieldKind, Raster, UnscaleRange};
use rand::Rng;
use test_utils::{
    assert_approx_eq, gaussian_peak, linear_ramp, quantized_scalar_raster, quantized_vector_raster,
    to_f32, with_nans,
};

fn physical_ramp(width: usize, height: usize) -> Raster {
    Raster::physical(to_f32(&linear_ramp(width, height)), width as u32, height as u32).unwrap()
}

fn physical_peak(width: usize, height: usize, amplitude: f64) -> Raster {
    let data = gaussian_peak(width, height, 8.0, 6.0, 3.0, 10.0, amplitude);
    Raster::physical(to_f32(&data), width as u32, height as u32).unwrap()
}

// =============================================================================
// RAW SAMPLING
// =============================================================================

#[test]
fn test_nearest_at_texel_centres_is_exact() {
    let (w, h) = (17, 11);
    let values = gaussian_peak(w, h, 8.0, 5.0, 3.0, 990.0, 40.0);
    let raster = Raster::quantized(quantized_scalar_raster(&values, 950.0, 1050.0), w as u32, h as u32)
        .unwrap();

    for y in 0..h {
        for x in 0..w {
            let uv_x = (x as f64 + 0.5) / w as f64;
            let uv_y = (y as f64 + 0.5) / h as f64;
            let got = sample(&raster, None, 0.0, Interpolation::Nearest, 0.0, uv_x, uv_y);
            assert_eq!(got, raster.pixel(x, y), "texel ({}, {})", x, y);
        }
    }
}

#[test]
fn test_nearest_matches_rounded_pixel() {
    let (w, h) = (23, 9);
    let raster = physical_peak(w, h, 30.0);
    let mut rng = rand::thread_rng();

    for _ in 0..500 {
        let uv_x: f64 = rng.gen_range(0.0..1.0);
        let uv_y: f64 = rng.gen_range(0.0..1.0);
        let px = ((uv_x * w as f64 - 0.5).round().max(0.0) as usize).min(w - 1);
        let py = ((uv_y * h as f64 - 0.5).round().max(0.0) as usize).min(h - 1);
        let got = sample(&raster, None, 0.0, Interpolation::Nearest, 0.0, uv_x, uv_y);
        assert_eq!(got, raster.pixel(px, py), "uv ({}, {})", uv_x, uv_y);
    }
}

#[test]
fn test_linear_at_texel_centres_is_exact() {
    let (w, h) = (12, 8);
    let raster = physical_peak(w, h, 25.0);
    for y in 0..h {
        for x in 0..w {
            let uv_x = (x as f64 + 0.5) / w as f64;
            let uv_y = (y as f64 + 0.5) / h as f64;
            let got = sample(&raster, None, 0.0, Interpolation::Linear, 0.0, uv_x, uv_y);
            assert_approx_eq!(got[0], raster.pixel(x, y)[0], 1e-9);
        }
    }
}

#[test]
fn test_linear_between_texels_interpolates() {
    let raster = physical_ramp(10, 4);
    // halfway between the centres of columns 3 and 4
    let got = sample(&raster, None, 0.0, Interpolation::Linear, 0.0, 0.4, 0.5);
    assert_approx_eq!(got[0], 3.5, 1e-9);
}

#[test]
fn test_cubic_preserves_linear_ramp_interior() {
    let raster = physical_ramp(20, 6);
    let got = sample(&raster, None, 0.0, Interpolation::Cubic, 0.0, 0.5, 0.5);
    // B-spline reproduces linear functions away from the clamped edges
    assert_approx_eq!(got[0], 9.5, 1e-9);
}

#[test]
fn test_cubic_halo_is_dropped_near_nodata() {
    let (w, h) = (10, 10);
    let data = with_nans(linear_ramp(w, h), w, &[(5, 5)]);
    let raster = Raster::physical(to_f32(&data), w as u32, h as u32).unwrap();

    let near = sample(&raster, None, 0.0, Interpolation::Cubic, 0.0, 0.45, 0.45);
    assert!(near[0].is_nan());
    let far = sample(&raster, None, 0.0, Interpolation::Cubic, 0.0, 0.15, 0.15);
    assert!(!far[0].is_nan());
}

#[test]
fn test_smoothing_softens_peak() {
    let raster = physical_peak(17, 13, 50.0);
    let centre_u = 8.5 / 17.0;
    let centre_v = 6.5 / 13.0;
    let sharp = sample(&raster, None, 0.0, Interpolation::Linear, 0.0, centre_u, centre_v);
    let soft = sample(&raster, None, 2.0, Interpolation::Linear, 0.0, centre_u, centre_v);
    assert!(soft[0] <= sharp[0]);
}

// =============================================================================
// TIME BLEND
// =============================================================================

#[test]
fn test_blend_weight_boundaries() {
    let (w, h) = (16, 12);
    let now = physical_peak(w, h, 20.0);
    let next = physical_peak(w, h, 60.0);
    let mut rng = rand::thread_rng();

    for interpolation in [Interpolation::Nearest, Interpolation::Linear, Interpolation::Cubic] {
        for _ in 0..50 {
            let uv_x: f64 = rng.gen_range(0.0..1.0);
            let uv_y: f64 = rng.gen_range(0.0..1.0);
            let smoothing = rng.gen_range(0.0..3.0);

            let only_now = sample(&now, None, smoothing, interpolation, 0.0, uv_x, uv_y);
            let only_next = sample(&next, None, smoothing, interpolation, 0.0, uv_x, uv_y);

            let at_zero = sample(&now, Some(&next), smoothing, interpolation, 0.0, uv_x, uv_y);
            let at_one = sample(&now, Some(&next), smoothing, interpolation, 1.0, uv_x, uv_y);
            assert_eq!(at_zero, only_now);
            assert_eq!(at_one, only_next);
        }
    }
}

#[test]
fn test_blend_midpoint_averages() {
    let now = physical_peak(16, 12, 20.0);
    let next = physical_peak(16, 12, 60.0);
    let a = sample(&now, None, 0.0, Interpolation::Linear, 0.0, 0.3, 0.6);
    let b = sample(&next, None, 0.0, Interpolation::Linear, 0.0, 0.3, 0.6);
    let mid = sample(&now, Some(&next), 0.0, Interpolation::Linear, 0.5, 0.3, 0.6);
    assert_approx_eq!(mid[0], (a[0] + b[0]) / 2.0, 1e-9);
}

// =============================================================================
// GEOGRAPHIC SAMPLER
// =============================================================================

#[test]
fn test_sample_at_outside_bounds_is_no_data() {
    let raster = physical_ramp(20, 10);
    let bounds = Bounds::new(0.0, 0.0, 20.0, 10.0);
    let sampler = FieldSampler::new(&raster, None, bounds, FieldKind::Scalar, None).unwrap();

    assert!(!sampler.sample_at([25.0, 5.0]).has_value());
    assert!(!sampler.sample_at([10.0, -1.0]).has_value());
    assert!(sampler.sample_at([10.0, 5.0]).has_value());
}

#[test]
fn test_sample_at_cell_centres_on_ramp() {
    // one cell per degree, cell k holds k and is centred on k + 0.5
    let raster = physical_ramp(20, 10);
    let bounds = Bounds::new(0.0, 0.0, 20.0, 10.0);
    let sampler = FieldSampler::new(&raster, None, bounds, FieldKind::Scalar, None).unwrap();

    for lng in [2.5, 7.25, 12.5, 15.0] {
        assert_approx_eq!(sampler.sample_at([lng, 5.0]).value, lng - 0.5, 1e-9);
    }
}

#[test]
fn test_sample_at_contour_vertices_returns_level() {
    let (w, h) = (100, 50);
    let raster = physical_ramp(w, h);
    let bounds = Bounds::new(0.0, 0.0, 100.0, 50.0);
    let sampler = FieldSampler::new(&raster, None, bounds, FieldKind::Scalar, None).unwrap();

    let grid = sampler.magnitude_grid();
    let features = contour_lines(&grid, 10.0, &bounds, &EngineConfig::default()).unwrap();
    assert!(!features.is_empty());
    for feature in &features {
        for &c in &feature.coordinates {
            assert_approx_eq!(sampler.sample_at(c).value, feature.value, 1e-6);
        }
    }
}

#[test]
fn test_sample_at_extremum_returns_peak_value() {
    let (w, h) = (30, 20);
    let data = gaussian_peak(w, h, 14.0, 9.0, 3.0, 0.0, 80.0);
    let raster = Raster::physical(to_f32(&data), w as u32, h as u32).unwrap();
    let bounds = Bounds::new(-15.0, -10.0, 15.0, 10.0);
    let sampler = FieldSampler::new(&raster, None, bounds, FieldKind::Scalar, None).unwrap();

    let config = EngineConfig {
        contour_blur: false,
        ..Default::default()
    };
    let points = find_extrema(&sampler.magnitude_grid(), 500.0, &bounds, &config).unwrap();
    let highs: Vec<_> = points.iter().filter(|p| p.kind == ExtremumKind::High).collect();
    assert_eq!(highs.len(), 1);
    let raw_peak = raster.pixel(14, 9)[0];
    assert_approx_eq!(sampler.sample_at(highs[0].position).value, raw_peak, 1e-6);
}

#[test]
fn test_sample_at_wraps_longitude() {
    let raster = physical_ramp(36, 18);
    let sampler =
        FieldSampler::new(&raster, None, Bounds::global(), FieldKind::Scalar, None).unwrap();
    let a = sampler.sample_at([-170.0, 0.0]);
    let b = sampler.sample_at([190.0, 0.0]);
    assert_eq!(a.value, b.value);
}

#[test]
fn test_sample_at_nodata_cell() {
    let (w, h) = (8, 8);
    let data = with_nans(linear_ramp(w, h), w, &[(3, 3)]);
    let raster = Raster::physical(to_f32(&data), w as u32, h as u32).unwrap();
    let sampler = FieldSampler::new(&raster, None, Bounds::new(0.0, 0.0, 8.0, 8.0), FieldKind::Scalar, None)
        .unwrap()
        .with_interpolation(Interpolation::Nearest);

    // centre of cell (3, 3)
    let sample = sampler.sample_at([3.5, 4.5]);
    assert!(!sample.has_value());
    assert!(sample.direction.is_nan());
}

#[test]
fn test_sample_points_pairs_positions_with_samples() {
    let (w, h) = (8, 8);
    let data = with_nans(linear_ramp(w, h), w, &[(3, 3)]);
    let raster = Raster::physical(to_f32(&data), w as u32, h as u32).unwrap();
    let sampler = FieldSampler::new(&raster, None, Bounds::new(0.0, 0.0, 8.0, 8.0), FieldKind::Scalar, None)
        .unwrap()
        .with_interpolation(Interpolation::Nearest);

    let positions = [[1.5, 6.5], [3.5, 4.5], [12.0, 4.0], [6.5, 0.5]];
    let samples = sampler.sample_points(&positions);

    assert_eq!(samples.len(), positions.len());
    for (sample, position) in samples.iter().zip(positions.iter()) {
        assert_eq!(sample.position, *position);
    }
    assert_approx_eq!(samples[0].sample.value, 1.0, 1e-9);
    assert!(!samples[1].sample.has_value());
    assert!(!samples[2].sample.has_value());
    assert_approx_eq!(samples[3].sample.value, 6.0, 1e-9);
}

#[test]
fn test_quantized_vector_magnitude_and_direction() {
    let (w, h) = (6, 4);
    let u = vec![5.0; w * h];
    let v = vec![0.0; w * h];
    let raster = Raster::quantized(quantized_vector_raster(&u, &v, -10.0, 10.0), w as u32, h as u32)
        .unwrap();
    let sampler = FieldSampler::new(
        &raster,
        None,
        Bounds::new(0.0, 0.0, 6.0, 4.0),
        FieldKind::Vector,
        Some(UnscaleRange::new(-10.0, 10.0)),
    )
    .unwrap();

    let sample = sampler.sample_at([3.0, 2.0]);
    // quantization to 1/255 of the range
    assert_approx_eq!(sample.value, 5.0, 0.1);
    // eastward component only
    assert_approx_eq!(sample.direction, 270.0, 1.0);
}

#[test]
fn test_unsupported_layout_fails_fast() {
    // three physical bands matches neither scalar nor vector
    let raster = Raster::physical(vec![0.0; 3 * 4], 2, 2).unwrap();
    let err = FieldSampler::new(&raster, None, Bounds::global(), FieldKind::Scalar, None).unwrap_err();
    assert!(err.is_format_error());
}

#[test]
fn test_time_slices_must_share_layout() {
    let scalar = Raster::physical(vec![0.0; 4], 2, 2).unwrap();
    let vector = Raster::physical(vec![0.0; 8], 2, 2).unwrap();
    assert!(
        FieldSampler::new(&scalar, Some(&vector), Bounds::global(), FieldKind::Scalar, None)
            .is_err()
    );
}

#[test]
fn test_magnitude_grid_without_filtering_is_raw() {
    let raster = physical_peak(12, 9, 15.0);
    let sampler =
        FieldSampler::new(&raster, None, Bounds::new(0.0, 0.0, 12.0, 9.0), FieldKind::Scalar, None)
            .unwrap();
    let decoder = FieldDecoder::resolve(&raster, FieldKind::Scalar, None).unwrap();
    assert_eq!(sampler.magnitude_grid(), decoder.magnitude_grid(&raster));
}

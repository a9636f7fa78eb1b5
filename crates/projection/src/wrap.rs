//! Longitude wrapping and bounds normalisation.

use field_common::{Bounds, MAX_MERCATOR_LAT};

/// Normalise a longitude to `[-180, 180)`.
///
/// With `min_lng`, the result is shifted by 360 when it falls below
/// `min_lng`, giving a value in `[min_lng, min_lng + 360)` for any
/// `min_lng` in `[-180, 180)`.
pub fn wrap_longitude(lng: f64, min_lng: Option<f64>) -> f64 {
    let mut wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped >= 180.0 {
        wrapped -= 360.0;
    }
    match min_lng {
        Some(min) if wrapped < min => wrapped + 360.0,
        _ => wrapped,
    }
}

fn clamp_latitude(lat: f64) -> f64 {
    lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT)
}

/// Normalise bounds for drawing.
///
/// Boxes spanning 360° or more become `[-180, 180]`. Narrower boxes get a
/// wrapped `min_lng` and a `max_lng` kept east of it, so a box crossing the
/// antimeridian ends above 180. Latitudes are clamped to the Mercator limit.
pub fn wrap_bounds(bounds: &Bounds) -> Bounds {
    let (min_lng, max_lng) = if bounds.width() < 360.0 {
        let min_lng = wrap_longitude(bounds.min_lng, None);
        let mut max_lng = wrap_longitude(bounds.max_lng, Some(min_lng));
        if max_lng == min_lng && bounds.width() > 0.0 {
            max_lng += 360.0;
        }
        (min_lng, max_lng)
    } else {
        (-180.0, 180.0)
    };

    Bounds::new(
        min_lng,
        clamp_latitude(bounds.min_lat),
        max_lng,
        clamp_latitude(bounds.max_lat),
    )
}

/// Clip bounds to the drawable world `[-180, 180] x ±85.051129`.
///
/// Unlike [`wrap_bounds`] the longitudes are clamped, not wrapped; near
/// global boxes come back as the full longitude range.
pub fn clip_bounds(bounds: &Bounds) -> Bounds {
    let (min_lng, max_lng) = if bounds.width() < 360.0 {
        (bounds.min_lng.clamp(-180.0, 180.0), bounds.max_lng.clamp(-180.0, 180.0))
    } else {
        (-180.0, 180.0)
    };

    Bounds::new(
        min_lng,
        clamp_latitude(bounds.min_lat),
        max_lng,
        clamp_latitude(bounds.max_lat),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(190.0, None), -170.0);
        assert_eq!(wrap_longitude(-190.0, None), 170.0);
        assert_eq!(wrap_longitude(180.0, None), -180.0);
        assert_eq!(wrap_longitude(-180.0, None), -180.0);
        assert_eq!(wrap_longitude(540.0, None), -180.0);
        assert_eq!(wrap_longitude(12.5, None), 12.5);
    }

    #[test]
    fn test_wrap_longitude_min() {
        assert_eq!(wrap_longitude(-190.0, Some(-180.0)), 170.0);
        assert_eq!(wrap_longitude(-170.0, Some(0.0)), 190.0);
        assert_eq!(wrap_longitude(-10.0, Some(170.0)), 350.0);
        assert_eq!(wrap_longitude(175.0, Some(170.0)), 175.0);
    }

    #[test]
    fn test_wrap_bounds_antimeridian() {
        let b = wrap_bounds(&Bounds::new(170.0, -10.0, 190.0, 10.0));
        assert_eq!(b.min_lng, 170.0);
        assert_eq!(b.max_lng, 190.0);

        let b = wrap_bounds(&Bounds::new(-200.0, -90.0, -170.0, 90.0));
        assert_eq!(b.min_lng, 160.0);
        assert_eq!(b.max_lng, 190.0);
        assert_eq!(b.min_lat, -MAX_MERCATOR_LAT);
        assert_eq!(b.max_lat, MAX_MERCATOR_LAT);
    }

    #[test]
    fn test_wrap_bounds_near_global() {
        let b = wrap_bounds(&Bounds::new(-300.0, -50.0, 200.0, 50.0));
        assert_eq!(b.to_array(), [-180.0, -50.0, 180.0, 50.0]);
    }

    #[test]
    fn test_clip_bounds() {
        let b = clip_bounds(&Bounds::new(170.0, -89.0, 190.0, 89.0));
        assert_eq!(b.to_array(), [170.0, -MAX_MERCATOR_LAT, 180.0, MAX_MERCATOR_LAT]);

        let b = clip_bounds(&Bounds::new(-400.0, 0.0, 400.0, 10.0));
        assert_eq!(b.to_array(), [-180.0, 0.0, 180.0, 10.0]);
    }
}

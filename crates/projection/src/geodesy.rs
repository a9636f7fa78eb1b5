//! Great-circle math on a sphere.
//!
//! The radius matches the one used by the globe view so distances agree
//! with what the renderer shows.

use field_common::LngLat;

/// Sphere radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_370_972.0;

/// Great-circle (haversine) distance between two positions, in meters.
pub fn distance(a: LngLat, b: LngLat) -> f64 {
    let lat1 = a[1].to_radians();
    let lat2 = b[1].to_radians();
    let delta_lat = (b[1] - a[1]).to_radians();
    let delta_lng = (b[0] - a[0]).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    // clamp guards asin against h creeping past 1 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Position reached travelling `distance_m` meters from `start` along the
/// initial bearing `bearing_deg` (degrees clockwise from north).
pub fn destination_point(start: LngLat, distance_m: f64, bearing_deg: f64) -> LngLat {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let phi1 = start[1].to_radians();
    let lambda1 = start[0].to_radians();

    let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos();
    let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();
    let y = theta.sin() * delta.sin() * phi1.cos();
    let x = delta.cos() - phi1.sin() * sin_phi2;
    let lambda2 = lambda1 + y.atan2(x);

    [lambda2.to_degrees(), phi2.to_degrees()]
}

/// Initial bearing from `a` toward `b`, in degrees `[0, 360)` clockwise
/// from north.
pub fn initial_bearing(a: LngLat, b: LngLat) -> f64 {
    let phi1 = a[1].to_radians();
    let phi2 = b[1].to_radians();
    let delta_lambda = (b[0] - a[0]).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();
    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    if bearing >= 360.0 {
        bearing - 360.0
    } else {
        bearing
    }
}

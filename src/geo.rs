//! Spherical-earth geometry for proximity search and map overlays.

use serde::{Deserialize, Serialize};

/// Equatorial radius used by the map widget, in meters
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Angular step between vertices of a display circle
pub const CIRCLE_STEP_DEG: usize = 10;

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Great-circle (haversine) distance between two points, in meters
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h slightly above 1 for antipodal points
    let c = 2.0 * h.min(1.0).sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Point reached by travelling `distance_m` from `origin` on initial bearing
/// `bearing_deg` (clockwise from north)
pub fn destination_point(origin: GeoPoint, distance_m: f64, bearing_deg: f64) -> GeoPoint {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    GeoPoint::new(lat2.to_degrees(), normalize_longitude(lon2.to_degrees()))
}

/// Closed ring approximating a circle: one vertex every 10° from 0° through 360°
pub fn circle_polygon(center: GeoPoint, radius_m: f64) -> Vec<GeoPoint> {
    (0..=360)
        .step_by(CIRCLE_STEP_DEG)
        .map(|bearing| destination_point(center, radius_m, bearing as f64))
        .collect()
}

fn normalize_longitude(lon: f64) -> f64 {
    (lon + 540.0).rem_euclid(360.0) - 180.0
}

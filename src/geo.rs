use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius in nautical miles. Distances stay in NM so they pair
/// with speeds in knots without conversion.
const EARTH_RADIUS_NM: f64 = 3440.065;

/// Points closer than this are treated as the same spot (nautical miles).
pub const SAME_POINT_NM: f64 = 1e-9;

/// A geographic point in degrees. Out of range values are tolerated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}°, {:.6}°)", self.lat, self.lng)
    }
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Initial great-circle bearing from this point to `other`.
    /// Returns degrees in [0, 360), 0 is North. Identical points give 0.
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        let lat_from = self.lat.to_radians();
        let lat_to = other.lat.to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let y = delta_lng.sin() * lat_to.cos();
        let x = lat_from.cos() * lat_to.sin() - lat_from.sin() * lat_to.cos() * delta_lng.cos();

        // atan2(0, 0) is 0, so the degenerate case lands on North.
        let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negative inputs
        if bearing >= 360.0 { 0.0 } else { bearing }
    }

    /// Haversine distance to `other` in nautical miles.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let lat_from = self.lat.to_radians();
        let lat_to = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat_from.cos() * lat_to.cos() * (delta_lng / 2.0).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_NM * c
    }

    /// Project this point `distance_nm` nautical miles along `bearing_deg`.
    pub fn project(&self, bearing_deg: f64, distance_nm: f64) -> GeoPoint {
        let lat1 = self.lat.to_radians();
        let lng1 = self.lng.to_radians();
        let brng = bearing_deg.to_radians();
        let angular_distance = distance_nm / EARTH_RADIUS_NM;

        let lat2 = (lat1.sin() * angular_distance.cos()
            + lat1.cos() * angular_distance.sin() * brng.cos())
        .asin();

        let lng2 = lng1
            + (brng.sin() * angular_distance.sin() * lat1.cos())
                .atan2(angular_distance.cos() - lat1.sin() * lat2.sin());

        // Normalize longitude to -180 to 180
        let lng2 = (lng2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;

        GeoPoint::new(lat2.to_degrees(), lng2)
    }
}

/// Initial bearing in degrees [0, 360) from `from` to `to`.
pub fn bearing(from: &GeoPoint, to: &GeoPoint) -> f64 {
    from.bearing_to(to)
}

/// Great-circle distance in nautical miles. Symmetric and non-negative.
pub fn distance(from: &GeoPoint, to: &GeoPoint) -> f64 {
    from.distance_to(to)
}

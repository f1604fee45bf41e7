//! Locally-flat equirectangular projection around a grid center.
//!
//! All cell geometry and point-in-cell tests run in this plane, in
//! kilometres, with `x` pointing east and `y` north. At the scales a grid
//! covers (tens of kilometres) the distortion is far below cell size.

use crate::data::point::SignalPoint;

/// Kilometres per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEGREE: f64 = 111.32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin_lat: f64,
    origin_lon: f64,
    km_per_deg_lon: f64,
}

impl LocalProjection {
    pub fn new(origin_lat: f64, origin_lon: f64) -> Self {
        // Clamp away from the poles so longitude scaling never collapses to 0.
        let cos_lat = origin_lat.to_radians().cos().max(1e-6);
        Self {
            origin_lat,
            origin_lon,
            km_per_deg_lon: KM_PER_DEGREE * cos_lat,
        }
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.origin_lat, self.origin_lon)
    }

    /// (lat, lon) in degrees to plane (x, y) in km. Longitudes across the
    /// antimeridian from the origin map to the near side.
    pub fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        let x = wrap_longitude(lon - self.origin_lon) * self.km_per_deg_lon;
        let y = (lat - self.origin_lat) * KM_PER_DEGREE;
        (x, y)
    }

    /// Plane (x, y) in km back to (lat, lon) in degrees.
    pub fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let lat = self.origin_lat + y / KM_PER_DEGREE;
        let lon = wrap_longitude(self.origin_lon + x / self.km_per_deg_lon);
        (lat, lon)
    }

    /// Planar distance in km from the origin.
    pub fn distance_km(&self, lat: f64, lon: f64) -> f64 {
        let (x, y) = self.project(lat, lon);
        x.hypot(y)
    }
}

/// Bring a longitude (or longitude difference) into [-180, 180].
fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

/// Whether a point lies within `radius_km` of the center (inclusive).
pub fn within_radius(point: &SignalPoint, center_lat: f64, center_lon: f64, radius_km: f64) -> bool {
    LocalProjection::new(center_lat, center_lon).distance_km(point.latitude, point.longitude)
        <= radius_km
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn project_unproject_round_trip() {
        let proj = LocalProjection::new(39.9042, 116.4074);
        let (x, y) = proj.project(39.95, 116.35);
        let (lat, lon) = proj.unproject(x, y);
        assert_relative_eq!(lat, 39.95, epsilon = 1e-12);
        assert_relative_eq!(lon, 116.35, epsilon = 1e-12);
    }

    #[test]
    fn one_degree_north_is_km_per_degree() {
        let proj = LocalProjection::new(0.0, 0.0);
        assert_relative_eq!(proj.distance_km(1.0, 0.0), KM_PER_DEGREE);
        assert_relative_eq!(proj.distance_km(0.0, 1.0), KM_PER_DEGREE);
    }

    #[test]
    fn longitude_shrinks_with_latitude() {
        let proj = LocalProjection::new(60.0, 0.0);
        assert_relative_eq!(proj.distance_km(60.0, 1.0), KM_PER_DEGREE * 0.5, epsilon = 1e-9);
    }

    #[test]
    fn antimeridian_is_continuous() {
        let proj = LocalProjection::new(0.0, 179.9);
        let (x, _) = proj.project(0.0, -179.9);
        assert_relative_eq!(x, 0.2 * KM_PER_DEGREE, epsilon = 1e-6);
        let (west, _) = LocalProjection::new(0.0, -179.9).project(0.0, 179.9);
        assert_relative_eq!(west, -0.2 * KM_PER_DEGREE, epsilon = 1e-6);

        let (_, lon) = proj.unproject(0.2 * KM_PER_DEGREE, 0.0);
        assert_relative_eq!(lon, -179.9, epsilon = 1e-9);
    }

    #[test]
    fn radius_filter_is_inclusive() {
        let p = SignalPoint::new(0.0, 1.0);
        assert!(within_radius(&p, 0.0, 0.0, KM_PER_DEGREE));
        assert!(!within_radius(&p, 0.0, 0.0, KM_PER_DEGREE - 1e-6));
    }
}

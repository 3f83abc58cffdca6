// SPDX-License-Identifier: MIT

//! Geospatial distance evaluation for the check-in geofence.
//!
//! Distances are great-circle (haversine) on a spherical Earth. The gate
//! comparison and the displayed distance both use feet so the two can never
//! disagree.

use geo::{Distance, HaversineMeasure, Point};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (spherical approximation).
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Feet per meter, for display and radius comparison.
pub const FEET_PER_METER: f64 = 3.28084;

const HAVERSINE: HaversineMeasure = HaversineMeasure::new(EARTH_RADIUS_METERS);

/// A validated geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting out-of-range or non-finite values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeoError::InvalidCoordinate(
                "latitude and longitude must be finite numbers".to_string(),
            ));
        }
        if latitude.abs() > 90.0 {
            return Err(GeoError::InvalidCoordinate(format!(
                "latitude {} out of range [-90, 90]",
                latitude
            )));
        }
        if longitude.abs() > 180.0 {
            return Err(GeoError::InvalidCoordinate(format!(
                "longitude {} out of range [-180, 180]",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Great-circle distance between two coordinates in meters.
///
/// Identical coordinates yield 0.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    HAVERSINE.distance(a.to_point(), b.to_point())
}

/// Great-circle distance between two coordinates in feet.
pub fn distance_feet(a: Coordinate, b: Coordinate) -> f64 {
    distance_meters(a, b) * FEET_PER_METER
}

/// Whether `point` lies within `radius_feet` of `anchor`.
///
/// The boundary is inclusive: a point exactly at the radius passes.
pub fn within_radius(anchor: Coordinate, point: Coordinate, radius_feet: f64) -> bool {
    distance_feet(anchor, point) <= radius_feet
}

/// Errors from coordinate validation.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("{0}")]
    InvalidCoordinate(String),
}

impl From<GeoError> for crate::error::AppError {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::InvalidCoordinate(msg) => crate::error::AppError::InvalidCoordinate(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_identical_points_zero_distance() {
        let anchor = coord(40.0, -75.0);
        assert_eq!(distance_meters(anchor, anchor), 0.0);
        assert!(within_radius(anchor, anchor, 0.0));
    }

    #[test]
    fn test_one_degree_latitude() {
        // One degree of latitude is ~111.2 km on a 6371 km sphere.
        let d = distance_meters(coord(0.0, 0.0), coord(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 100.0, "got {}", d);
    }

    #[test]
    fn test_known_near_and_far_points() {
        // The scenario from the check-in flow: anchor at (40, -75), radius 25 ft.
        let anchor = coord(40.0, -75.0);

        let far = coord(40.0, -75.0010);
        let far_feet = distance_feet(anchor, far);
        assert!(far_feet > 270.0 && far_feet < 290.0, "got {} ft", far_feet);
        assert!(!within_radius(anchor, far, 25.0));

        let near = coord(40.00001, -75.00001);
        let near_feet = distance_feet(anchor, near);
        assert!(near_feet < 6.0, "got {} ft", near_feet);
        assert!(within_radius(anchor, near, 25.0));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let anchor = coord(40.0, -75.0);
        let point = coord(40.0001, -75.0);
        let exact = distance_feet(anchor, point);
        assert!(within_radius(anchor, point, exact));
        assert!(!within_radius(anchor, point, exact - 0.001));
    }

    #[test]
    fn test_symmetry() {
        let a = coord(37.33, -122.03);
        let b = coord(37.42, -122.08);
        assert!((distance_meters(a, b) - distance_meters(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Coordinate::new(90.1, 0.0).is_err());
        assert!(Coordinate::new(-91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, 180.5).is_err());
        assert!(Coordinate::new(0.0, -181.0).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_accepts_poles_and_antimeridian() {
        assert!(Coordinate::new(90.0, 0.0).is_ok());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
        // Antipodal points are a valid (if maximal) distance, not an error.
        let d = distance_meters(coord(0.0, 0.0), coord(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1.0);
    }
}

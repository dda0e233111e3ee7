//! Geographic primitives for the photopost pipeline.
//!
//! This crate provides:
//! - [`Coordinate`] with range validation
//! - Sexagesimal (EXIF GPS) to decimal conversion
//! - Haversine distance between two fixes
//!
//! # Example
//!
//! ```
//! use photopost_geo::{dms_to_decimal, Coordinate};
//!
//! let lat = dms_to_decimal(&[52.0, 22.0, 12.0], 'N');
//! let lon = dms_to_decimal(&[4.0, 53.0, 42.0], 'E');
//! let amsterdam = Coordinate::try_new(lat, lon).unwrap();
//! let paris = Coordinate::try_new(48.8566, 2.3522).unwrap();
//!
//! assert!((amsterdam.distance_km(&paris) - 430.0).abs() < 10.0);
//! ```

mod dms;
mod error;
mod haversine;

pub use dms::{dms_to_decimal, is_negative_hemisphere};
pub use error::{GeoError, GeoErrorCode, Result};
pub use haversine::{haversine_distance, haversine_distance_meters, EARTH_RADIUS_KM, EARTH_RADIUS_M};

use std::fmt;

/// Valid latitude range in degrees.
pub const LATITUDE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in degrees.
pub const LONGITUDE_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// A geographic coordinate with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate without validation.
    ///
    /// Prefer [`Coordinate::try_new`] for values coming from outside the
    /// process.
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Creates a coordinate, rejecting non-finite or out-of-range values.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeoError::NonFinite);
        }
        let coord = Self::new(latitude, longitude);
        if !coord.is_valid() {
            return Err(GeoError::OutOfRange { latitude, longitude });
        }
        Ok(coord)
    }

    /// Returns true if the coordinate has valid values.
    #[inline]
    pub fn is_valid(&self) -> bool {
        LATITUDE_RANGE.contains(&self.latitude) && LONGITUDE_RANGE.contains(&self.longitude)
    }

    /// Great-circle distance to `other` in kilometers.
    #[inline]
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_distance(self, other)
    }

    #[inline]
    pub(crate) fn to_radians(self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

impl TryFrom<(f64, f64)> for Coordinate {
    type Error = GeoError;

    fn try_from((lat, lon): (f64, f64)) -> Result<Self> {
        Self::try_new(lat, lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_coordinate_bounds_are_inclusive() {
        assert!(Coordinate::try_new(90.0, 180.0).is_ok());
        assert!(Coordinate::try_new(-90.0, -180.0).is_ok());
        assert!(Coordinate::try_new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_coordinate_rejects_out_of_range() {
        assert_eq!(
            Coordinate::try_new(91.0, 0.0),
            Err(GeoError::OutOfRange { latitude: 91.0, longitude: 0.0 })
        );
        assert!(Coordinate::try_new(0.0, -180.5).is_err());
    }

    #[test]
    fn test_coordinate_rejects_nan() {
        assert_eq!(Coordinate::try_new(f64::NAN, 4.9), Err(GeoError::NonFinite));
        assert_eq!(Coordinate::try_new(52.0, f64::INFINITY), Err(GeoError::NonFinite));
    }

    #[test]
    fn test_coordinate_display() {
        let coord = Coordinate::new(52.37, 4.895);
        assert_eq!(coord.to_string(), "52.37000, 4.89500");
    }

    #[test]
    fn test_coordinate_from_tuple() {
        let coord: Coordinate = (48.85, 2.35).try_into().unwrap();
        assert_eq!(coord.latitude, 48.85);
        assert!(Coordinate::try_from((120.0, 2.35)).is_err());
    }

    proptest! {
        #[test]
        fn prop_validated_coordinates_stay_in_range(lat in -1000.0f64..1000.0, lon in -1000.0f64..1000.0) {
            match Coordinate::try_new(lat, lon) {
                Ok(c) => {
                    prop_assert!((-90.0..=90.0).contains(&c.latitude));
                    prop_assert!((-180.0..=180.0).contains(&c.longitude));
                }
                Err(_) => prop_assert!(!(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon)),
            }
        }
    }
}

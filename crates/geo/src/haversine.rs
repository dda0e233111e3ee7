//! Great-circle distance between two fixes.
//!
//! Used to report how far apart the photo's embedded position and the live
//! device position are when both are available.

use crate::Coordinate;

/// Earth's mean radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Earth's mean radius in meters.
pub const EARTH_RADIUS_M: f64 = EARTH_RADIUS_KM * 1000.0;

/// Distance between two coordinates in kilometers.
///
/// # Example
/// ```
/// use photopost_geo::{haversine_distance, Coordinate};
///
/// let amsterdam = Coordinate::new(52.370, 4.895);
/// let brussels = Coordinate::new(50.8503, 4.3517);
/// assert!((haversine_distance(&amsterdam, &brussels) - 173.0).abs() < 5.0);
/// ```
#[inline]
pub fn haversine_distance(from: &Coordinate, to: &Coordinate) -> f64 {
    central_angle(from, to) * EARTH_RADIUS_KM
}

/// Distance between two coordinates in meters.
#[inline]
pub fn haversine_distance_meters(from: &Coordinate, to: &Coordinate) -> f64 {
    central_angle(from, to) * EARTH_RADIUS_M
}

/// Central angle in radians between two points on the unit sphere.
fn central_angle(from: &Coordinate, to: &Coordinate) -> f64 {
    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();

    let half_chord = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lon2 - lon1) / 2.0).sin().powi(2);

    2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt())
}

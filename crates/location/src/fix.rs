//! Resolved positions and their provenance.

use chrono::{DateTime, Utc};
use photopost_geo::{Coordinate, Result};
use serde::Serialize;
use std::fmt;

/// Nominal radius recorded for fixes read from photo metadata.
///
/// Cameras do not report positional uncertainty, so this is a label, not a
/// measurement.
pub const METADATA_NOMINAL_RADIUS_M: f64 = 5.0;

/// Where a fix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Metadata,
    Device,
    Manual,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Metadata => "metadata",
            Source::Device => "device",
            Source::Manual => "manual",
        })
    }
}

/// Precision class of a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyClass {
    High,
    Medium,
    Low,
}

/// Precision class plus the radius it was derived from, when known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Accuracy {
    pub class: AccuracyClass,
    #[serde(rename = "radius_m", skip_serializing_if = "Option::is_none")]
    pub radius_m: Option<f64>,
}

impl Accuracy {
    /// Classify a sensor-reported radius: under 10 m is high, under 100 m
    /// medium, anything else (including NaN) low.
    pub fn from_radius(radius_m: f64) -> Self {
        let class = if radius_m < 10.0 {
            AccuracyClass::High
        } else if radius_m < 100.0 {
            AccuracyClass::Medium
        } else {
            AccuracyClass::Low
        };
        Self { class, radius_m: Some(radius_m) }
    }

    /// Qualitative high accuracy for embedded geotags.
    pub fn metadata() -> Self {
        Self {
            class: AccuracyClass::High,
            radius_m: Some(METADATA_NOMINAL_RADIUS_M),
        }
    }

    /// A position the user chose explicitly.
    pub fn manual() -> Self {
        Self {
            class: AccuracyClass::High,
            radius_m: None,
        }
    }
}

/// A single resolved position.
///
/// Construction validates the coordinate, so a `GeoFix` is always in range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoFix {
    #[serde(flatten)]
    coordinate: Coordinate,
    #[serde(skip_serializing_if = "Option::is_none")]
    altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    captured_at: Option<DateTime<Utc>>,
    accuracy: Accuracy,
    source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

impl GeoFix {
    /// Validate and build a fix.
    pub fn new(latitude: f64, longitude: f64, source: Source, accuracy: Accuracy) -> Result<Self> {
        Ok(Self {
            coordinate: Coordinate::try_new(latitude, longitude)?,
            altitude: None,
            captured_at: None,
            accuracy,
            source,
            display_name: None,
        })
    }

    /// A user-chosen position.
    pub fn manual(latitude: f64, longitude: f64) -> Result<Self> {
        Self::new(latitude, longitude, Source::Manual, Accuracy::manual())
    }

    #[must_use]
    pub fn with_altitude(mut self, altitude: Option<f64>) -> Self {
        self.altitude = altitude.filter(|a| a.is_finite());
        self
    }

    #[must_use]
    pub fn with_captured_at(mut self, captured_at: Option<DateTime<Utc>>) -> Self {
        self.captured_at = captured_at;
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// The same position re-issued as a manual choice.
    pub fn as_manual(&self) -> Self {
        Self {
            source: Source::Manual,
            accuracy: Accuracy::manual(),
            ..self.clone()
        }
    }

    pub fn latitude(&self) -> f64 {
        self.coordinate.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.coordinate.longitude
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }

    pub fn accuracy(&self) -> Accuracy {
        self.accuracy
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Link to the position on a public map.
    pub fn map_url(&self) -> String {
        format!(
            "https://maps.google.com/?q={},{}",
            self.coordinate.latitude, self.coordinate.longitude
        )
    }
}

impl fmt::Display for GeoFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{name} ({}) via {}", self.coordinate, self.source),
            None => write!(f, "{} via {}", self.coordinate, self.source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accuracy_classes() {
        assert_eq!(Accuracy::from_radius(3.0).class, AccuracyClass::High);
        assert_eq!(Accuracy::from_radius(9.99).class, AccuracyClass::High);
        assert_eq!(Accuracy::from_radius(10.0).class, AccuracyClass::Medium);
        assert_eq!(Accuracy::from_radius(15.0).class, AccuracyClass::Medium);
        assert_eq!(Accuracy::from_radius(100.0).class, AccuracyClass::Low);
        assert_eq!(Accuracy::from_radius(f64::NAN).class, AccuracyClass::Low);
    }

    #[test]
    fn test_metadata_accuracy_is_qualitative_high() {
        let acc = Accuracy::metadata();
        assert_eq!(acc.class, AccuracyClass::High);
        assert_eq!(acc.radius_m, Some(METADATA_NOMINAL_RADIUS_M));
    }

    #[test]
    fn test_out_of_range_never_builds() {
        assert!(GeoFix::manual(90.5, 0.0).is_err());
        assert!(GeoFix::new(0.0, 200.0, Source::Device, Accuracy::from_radius(5.0)).is_err());
        assert!(GeoFix::manual(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_map_url_and_display() {
        let fix = GeoFix::manual(48.85, 2.35).unwrap().with_display_name("Paris");
        assert_eq!(fix.map_url(), "https://maps.google.com/?q=48.85,2.35");
        assert_eq!(fix.to_string(), "Paris (48.85000, 2.35000) via manual");
    }

    #[test]
    fn test_as_manual_keeps_position() {
        let fix = GeoFix::new(51.0, 5.0, Source::Device, Accuracy::from_radius(15.0))
            .unwrap()
            .with_altitude(Some(42.0));
        let manual = fix.as_manual();
        assert_eq!(manual.source(), Source::Manual);
        assert_eq!(manual.accuracy().class, AccuracyClass::High);
        assert_eq!((manual.latitude(), manual.longitude()), (51.0, 5.0));
        assert_eq!(manual.altitude(), Some(42.0));
    }

    #[test]
    fn test_serializes_flat() {
        let fix = GeoFix::manual(48.85, 2.35).unwrap();
        let json = serde_json::to_value(&fix).unwrap();
        assert_eq!(json["latitude"], 48.85);
        assert_eq!(json["longitude"], 2.35);
        assert_eq!(json["source"], "manual");
        assert_eq!(json["accuracy"]["class"], "high");
        assert!(json.get("altitude").is_none());
    }

    proptest! {
        #[test]
        fn prop_fix_always_in_range(lat in -200.0f64..200.0, lon in -400.0f64..400.0) {
            if let Ok(fix) = GeoFix::manual(lat, lon) {
                prop_assert!((-90.0..=90.0).contains(&fix.latitude()));
                prop_assert!((-180.0..=180.0).contains(&fix.longitude()));
            } else {
                prop_assert!(lat.abs() > 90.0 || lon.abs() > 180.0);
            }
        }
    }
}

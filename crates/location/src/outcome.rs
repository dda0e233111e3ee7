//! What a single reader produced.

use crate::fix::GeoFix;
use serde::Serialize;
use std::fmt;

/// Why a reader produced no fix. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum NoFixReason {
    /// The photo carries no (complete) GPS tag set
    TagsAbsent,
    /// The metadata block could not be parsed
    Unreadable(String),
    /// Tags converted to an impossible coordinate
    OutOfRange,
    /// The reader's own deadline expired
    Timeout,
    /// No positioning capability on this host
    Unavailable,
    /// The user refused location access
    PermissionDenied,
    /// The sensor could not determine a position
    PositionUnavailable,
    /// Only a cached fix older than the allowed age was available
    Stale,
}

impl fmt::Display for NoFixReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoFixReason::TagsAbsent => f.write_str("no GPS tags in photo"),
            NoFixReason::Unreadable(detail) => write!(f, "photo metadata unreadable ({detail})"),
            NoFixReason::OutOfRange => f.write_str("GPS tags out of range"),
            NoFixReason::Timeout => f.write_str("timed out"),
            NoFixReason::Unavailable => f.write_str("location services unavailable"),
            NoFixReason::PermissionDenied => f.write_str("location permission denied"),
            NoFixReason::PositionUnavailable => f.write_str("position unavailable"),
            NoFixReason::Stale => f.write_str("cached position too old"),
        }
    }
}

/// Result of one reader: a fix or the reason there is none.
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderOutcome {
    Fix(GeoFix),
    NoFix(NoFixReason),
}

impl ReaderOutcome {
    pub fn fix(&self) -> Option<&GeoFix> {
        match self {
            ReaderOutcome::Fix(fix) => Some(fix),
            ReaderOutcome::NoFix(_) => None,
        }
    }

    pub fn into_fix(self) -> Option<GeoFix> {
        match self {
            ReaderOutcome::Fix(fix) => Some(fix),
            ReaderOutcome::NoFix(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&NoFixReason> {
        match self {
            ReaderOutcome::Fix(_) => None,
            ReaderOutcome::NoFix(reason) => Some(reason),
        }
    }
}

//! Error types for the geo crate.

use thiserror::Error;

/// Result type alias for geo operations.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Errors that can occur during geo operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// Latitude outside [-90, 90] or longitude outside [-180, 180]
    #[error("Coordinate out of range: ({latitude}, {longitude})")]
    OutOfRange {
        /// Offending latitude
        latitude: f64,
        /// Offending longitude
        longitude: f64,
    },

    /// NaN or infinite component
    #[error("Coordinate is not a finite number")]
    NonFinite,
}

/// Error code for integration with photopost-core error handling.
/// Range: 5xxx, shared with location errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoErrorCode {
    /// Out-of-range coordinate
    OutOfRange = 5101,
    /// NaN or infinite coordinate
    NonFinite = 5102,
}

impl GeoError {
    /// Returns the error code for this error.
    pub fn code(&self) -> GeoErrorCode {
        match self {
            GeoError::OutOfRange { .. } => GeoErrorCode::OutOfRange,
            GeoError::NonFinite => GeoErrorCode::NonFinite,
        }
    }
}

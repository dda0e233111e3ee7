//! User-facing error handling with codes, context and recovery suggestions
//!
//! Optional enrichment steps (metadata GPS, device GPS, transcoding, weather)
//! never produce one of these: they degrade to absence locally. This type is
//! reserved for the failures that make an upload impossible and therefore
//! have to be explained to the user:
//! - oversize input, rejected before any processing
//! - publish collaborator failures
//! - configuration problems at start-up

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // General errors (1xxx)
    Unknown = 1000,
    Internal = 1001,
    Timeout = 1003,

    // IO errors (2xxx)
    IoError = 2000,
    FileNotFound = 2001,
    PermissionDenied = 2002,

    // Configuration errors (3xxx)
    ConfigError = 3000,
    ConfigNotFound = 3001,
    ConfigParseError = 3002,
    ConfigValidationError = 3003,

    // Image errors (4xxx)
    ImageError = 4000,
    OversizeInput = 4001,

    // Location errors (5xxx)
    InvalidCoordinate = 5001,
    GeocodingFailed = 5002,

    // Network errors (6xxx)
    NetworkError = 6000,
    WeatherUnavailable = 6001,

    // Publish errors (7xxx)
    PublishError = 7000,
    MediaUploadFailed = 7001,
    PostCreationFailed = 7002,
    PayloadTooLarge = 7003,
    Unauthorized = 7004,

    // Validation errors (8xxx)
    ValidationError = 8000,
    InvalidInput = 8001,
    InvalidRating = 8002,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "General",
            2 => "IO",
            3 => "Configuration",
            4 => "Image",
            5 => "Location",
            6 => "Network",
            7 => "Publish",
            8 => "Validation",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Main error type with rich context
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Convert to a serializable report
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code,
            code_str: self.code.to_string(),
            category: self.code.category().to_string(),
            message: self.message.clone(),
            context: self.context.clone(),
            suggestion: self.suggestion.clone(),
            source: self.source.as_ref().map(|e| e.to_string()),
        }
    }

    // Convenience constructors

    pub fn file_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::FileNotFound,
            format!("File not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Check that the file exists and you have read permissions")
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create a photopost.toml file or use --config to specify a path")
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigValidationError, message)
    }

    pub fn oversize_input(size_bytes: usize, limit_bytes: usize) -> Self {
        Self::new(
            ErrorCode::OversizeInput,
            format!(
                "Photo is too large ({:.1} MB, maximum is {:.0} MB)",
                size_bytes as f64 / (1024.0 * 1024.0),
                limit_bytes as f64 / (1024.0 * 1024.0)
            ),
        )
        .with_suggestion("Choose a smaller photo or export it at a lower resolution")
    }

    pub fn payload_too_large() -> Self {
        Self::new(ErrorCode::PayloadTooLarge, "The server rejected the photo as too large")
            .with_suggestion("Try a smaller photo")
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "The server rejected the credentials")
            .with_suggestion("Check the site URL, username and application password")
    }

    pub fn invalid_rating(value: u8) -> Self {
        Self::new(
            ErrorCode::InvalidRating,
            format!("Rating must be between 1 and 5 stars, got {}", value),
        )
    }
}

/// Serializable error report for logging and API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub code_str: String,
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for CLI commands
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const VALIDATION_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const OVERSIZE_INPUT: i32 = 4;
    pub const PUBLISH_ERROR: i32 = 5;
    pub const TIMEOUT: i32 = 124;
}

impl Error {
    /// Map this error onto a process exit code
    pub fn exit_code(&self) -> i32 {
        match self.code.code() / 1000 {
            3 => exit_codes::CONFIG_ERROR,
            7 => exit_codes::PUBLISH_ERROR,
            8 => exit_codes::VALIDATION_ERROR,
            _ if self.code == ErrorCode::OversizeInput => exit_codes::OVERSIZE_INPUT,
            _ if self.code == ErrorCode::Timeout => exit_codes::TIMEOUT,
            _ => exit_codes::FAILURE,
        }
    }
}

// Implement From for common error types

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("JSON parse error: {}", err))
            .with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("TOML parse error: {}", err))
            .with_source(err)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_suggestion(suggestion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::FileNotFound.to_string(), "E2001");
        assert_eq!(ErrorCode::OversizeInput.to_string(), "E4001");
        assert_eq!(ErrorCode::PayloadTooLarge.to_string(), "E7003");
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::IoError.category(), "IO");
        assert_eq!(ErrorCode::OversizeInput.category(), "Image");
        assert_eq!(ErrorCode::WeatherUnavailable.category(), "Network");
        assert_eq!(ErrorCode::Unauthorized.category(), "Publish");
    }

    #[test]
    fn test_oversize_message_is_readable() {
        let err = Error::oversize_input(60 * 1024 * 1024, 50 * 1024 * 1024);
        assert_eq!(err.code, ErrorCode::OversizeInput);
        assert!(err.message.contains("60.0 MB"));
        assert!(err.message.contains("50 MB"));
        assert!(err.suggestion.is_some());
        assert_eq!(err.exit_code(), exit_codes::OVERSIZE_INPUT);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::file_not_found("/path/to/photo.jpg")
            .with_context("While reading the selected photo");

        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(err.context.is_some());
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::config("bad").exit_code(), exit_codes::CONFIG_ERROR);
        assert_eq!(Error::unauthorized().exit_code(), exit_codes::PUBLISH_ERROR);
        assert_eq!(Error::invalid_rating(9).exit_code(), exit_codes::VALIDATION_ERROR);
        assert_eq!(Error::new(ErrorCode::NetworkError, "offline").exit_code(), exit_codes::FAILURE);
    }

    #[test]
    fn test_error_report_serialization() {
        let err = Error::new(ErrorCode::PostCreationFailed, "Post creation failed: 500")
            .with_context("While publishing 'Sunset'");

        let report = err.to_report();
        let json = serde_json::to_string(&report).unwrap();

        assert!(json.contains("E7002"));
        assert!(json.contains("Publish"));
        assert!(json.contains("Sunset"));
    }
}

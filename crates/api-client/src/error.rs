//! Error types for the API client

use std::fmt;
use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// API returned an error response
    #[error("API error ({status}): {message}")]
    ApiResponse {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },

    /// Response parsed but lacked expected fields
    #[error("Unexpected response shape: {0}")]
    Malformed(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Caller-supplied value rejected before any request was made
    #[error("Invalid input: {0}")]
    Validation(String),

    /// One step of a publish failed
    #[error("{step} failed: {source}")]
    Publish {
        step: PublishStep,
        #[source]
        source: Box<ApiError>,
    },
}

/// The two requests a publish makes, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    MediaUpload,
    PostCreation,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PublishStep::MediaUpload => "Media upload",
            PublishStep::PostCreation => "Post creation",
        })
    }
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an API response error
    pub fn api_response(status: u16, message: impl Into<String>) -> Self {
        Self::ApiResponse {
            status,
            message: message.into(),
        }
    }

    /// Attribute a failure to a publish step
    pub fn at_step(self, step: PublishStep) -> Self {
        Self::Publish {
            step,
            source: Box::new(self),
        }
    }

    /// Create a malformed-payload error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// HTTP status if the server answered
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiResponse { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::Publish { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| s >= 500)
    }

    /// Human-readable reason for showing to the person publishing
    #[must_use]
    pub fn user_message(&self) -> String {
        if let Self::Publish { step, source } = self {
            return match source.status() {
                Some(413 | 401 | 403) => source.user_message(),
                _ => format!("{step} failed: {}", source.user_message()),
            };
        }
        match self.status() {
            Some(413) => "The photo is too large for the site to accept (HTTP 413)".to_string(),
            Some(401 | 403) => "The site rejected the credentials; check the username and application password".to_string(),
            Some(404) => "The site has no WordPress REST API at this address".to_string(),
            Some(status) if status >= 500 => format!("The site had an internal error (HTTP {status}); try again later"),
            _ => match self {
                Self::Request(e) if e.is_timeout() => "The site did not answer in time".to_string(),
                Self::Request(e) if e.is_connect() => "Could not connect to the site; check the URL and network".to_string(),
                other => other.to_string(),
            },
        }
    }
}

impl From<ApiError> for photopost_core::Error {
    fn from(err: ApiError) -> Self {
        use photopost_core::{Error, ErrorCode};

        let message = err.user_message();
        let code = match err.status() {
            Some(413) => return Error::payload_too_large(),
            Some(401 | 403) => return Error::unauthorized(),
            _ if matches!(err, ApiError::Publish { step: PublishStep::MediaUpload, .. }) => ErrorCode::MediaUploadFailed,
            _ if matches!(err, ApiError::Publish { step: PublishStep::PostCreation, .. }) => ErrorCode::PostCreationFailed,
            Some(_) => ErrorCode::PublishError,
            None => match err {
                ApiError::Config(_) | ApiError::InvalidUrl(_) => ErrorCode::ConfigError,
                ApiError::Validation(_) => ErrorCode::InvalidInput,
                _ => ErrorCode::NetworkError,
            },
        };
        Error::new(code, message).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photopost_core::ErrorCode;

    #[test]
    fn test_status_classification() {
        let err = ApiError::api_response(503, "Service Unavailable");
        assert!(err.is_server_error());
        assert!(!err.is_client_error());
        assert_eq!(err.status(), Some(503));
        assert!(ApiError::malformed("x").status().is_none());
    }

    #[test]
    fn test_payload_too_large_message() {
        let err = ApiError::api_response(413, "<html>Request Entity Too Large</html>");
        assert!(err.user_message().contains("too large"));

        let core: photopost_core::Error = err.into();
        assert_eq!(core.code, ErrorCode::PayloadTooLarge);
    }

    #[test]
    fn test_unauthorized_maps_to_core() {
        let core: photopost_core::Error = ApiError::api_response(401, "rest_not_logged_in").into();
        assert_eq!(core.code, ErrorCode::Unauthorized);
    }

    #[test]
    fn test_other_failures_keep_readable_reason() {
        let core: photopost_core::Error = ApiError::api_response(500, "boom").into();
        assert_eq!(core.code, ErrorCode::PublishError);
        assert!(core.message.contains("HTTP 500"));

        let core: photopost_core::Error = ApiError::Validation("rating".into()).into();
        assert_eq!(core.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_publish_steps_keep_their_codes() {
        let upload: photopost_core::Error = ApiError::api_response(500, "boom").at_step(PublishStep::MediaUpload).into();
        assert_eq!(upload.code, ErrorCode::MediaUploadFailed);
        assert!(upload.message.starts_with("Media upload failed"));
        assert!(upload.message.contains("HTTP 500"));

        let post = ApiError::malformed("no id").at_step(PublishStep::PostCreation);
        assert_eq!(post.status(), None);
        let core: photopost_core::Error = post.into();
        assert_eq!(core.code, ErrorCode::PostCreationFailed);
        assert_eq!(core.exit_code(), photopost_core::error::exit_codes::PUBLISH_ERROR);

        let too_large = ApiError::api_response(413, "nope").at_step(PublishStep::MediaUpload);
        assert_eq!(too_large.status(), Some(413));
        let core: photopost_core::Error = too_large.into();
        assert_eq!(core.code, ErrorCode::PayloadTooLarge);
    }
}

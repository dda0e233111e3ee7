//! Error types for the image crate.

use thiserror::Error;

/// Result type alias for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur during image operations.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Unknown image format
    #[error("Unknown image format")]
    UnknownFormat,

    /// Invalid image data
    #[error("Invalid image data: {0}")]
    InvalidData(String),

    /// Input larger than the configured ceiling; nothing was decoded
    #[error("Input is {size_bytes} bytes, limit is {limit_bytes} bytes")]
    OversizeInput {
        /// Input length
        size_bytes: usize,
        /// Configured ceiling
        limit_bytes: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    ProcessingError(#[from] image::ImageError),
}

impl From<ImageError> for photopost_core::Error {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::OversizeInput { size_bytes, limit_bytes } => {
                photopost_core::Error::oversize_input(size_bytes, limit_bytes)
            }
            ImageError::IoError(e) => e.into(),
            other => photopost_core::Error::new(photopost_core::ErrorCode::ImageError, other.to_string()),
        }
    }
}

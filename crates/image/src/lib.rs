//! Image handling for photo uploads.
//!
//! This crate provides:
//! - Format detection from magic bytes and header-level dimension probing
//! - The adaptive [`Transcoder`] (size ceiling, pass-through, downscale,
//!   keep-if-smaller, timeout fallback)
//! - Preview generation, independent of transcoding
//! - Alpha flattening ahead of JPEG encoding

#![warn(missing_docs)]

mod alpha;
mod asset;
mod detect;
mod dims;
mod error;
pub mod preview;
pub mod transcode;

#[cfg(test)]
mod test_support;

pub use alpha::{flatten_alpha, has_alpha_channel, WHITE};
pub use asset::{CompressionReport, ProcessedAsset, RawAsset, OCTET_STREAM};
pub use detect::{detect_format, ImageFormat};
pub use dims::{fit_longest_edge, fit_within, probe, ImageInfo};
pub use error::{ImageError, Result};
pub use preview::{generate_preview, Preview, PreviewError};
pub use transcode::{TranscodeDecision, TranscodeResult, Transcoder};

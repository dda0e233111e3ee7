//! Adaptive transcoding before upload.
//!
//! Large photos are scaled down and re-encoded as JPEG; small ones go up
//! untouched. Every failure short of an oversize input falls back to the
//! original bytes.

use crate::alpha::to_jpeg_compatible;
use crate::asset::{CompressionReport, ProcessedAsset, RawAsset};
use crate::dims::fit_within;
use crate::{ImageError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat};
use photopost_core::config::TranscodeConfig;
use serde::Serialize;
use std::io::Cursor;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Why the transcoder produced what it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranscodeDecision {
    /// Input under the pass-through threshold
    PassthroughSmall,
    /// Re-encoded output was not strictly smaller
    NotSmaller,
    /// Work exceeded the configured timeout
    Timeout,
    /// Input could not be decoded or encoded
    DecodeError,
    /// Output substituted for the input
    Recompressed,
}

impl TranscodeDecision {
    /// Short label used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscodeDecision::PassthroughSmall => "passthrough-small",
            TranscodeDecision::NotSmaller => "not-smaller",
            TranscodeDecision::Timeout => "timeout",
            TranscodeDecision::DecodeError => "decode-error",
            TranscodeDecision::Recompressed => "recompressed",
        }
    }
}

/// Outcome of a transcode run.
#[derive(Debug, Clone)]
pub struct TranscodeResult {
    /// What will be uploaded
    pub asset: ProcessedAsset,
    /// Present only when the output replaced the input
    pub report: Option<CompressionReport>,
    pub decision: TranscodeDecision,
}

/// Encoded JPEG plus its pixel dimensions.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Applies a [`TranscodeConfig`] to uploads.
#[derive(Debug, Clone)]
pub struct Transcoder {
    config: TranscodeConfig,
}

impl Transcoder {
    pub fn new(config: TranscodeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranscodeConfig {
        &self.config
    }

    /// Reject inputs above the size ceiling without touching their contents.
    pub fn check_size(&self, raw: &RawAsset) -> Result<()> {
        if raw.len() > self.config.max_input_bytes {
            return Err(ImageError::OversizeInput {
                size_bytes: raw.len(),
                limit_bytes: self.config.max_input_bytes,
            });
        }
        Ok(())
    }

    /// Decide whether to substitute a smaller derivative for `raw`.
    ///
    /// Only an oversize input is an error; everything else resolves to a
    /// [`TranscodeResult`].
    #[instrument(skip(self, raw), fields(file = %raw.file_name(), bytes = raw.len()))]
    pub async fn transcode(&self, raw: &RawAsset) -> Result<TranscodeResult> {
        self.check_size(raw)?;

        if raw.len() < self.config.passthrough_below_bytes {
            return Ok(self.keep_original(raw, TranscodeDecision::PassthroughSmall));
        }

        let started = Instant::now();
        let bytes = raw.shared_bytes();
        let (max_width, max_height) = (self.config.max_width, self.config.max_height);
        let quality = jpeg_quality(self.config.quality);

        let job = tokio::task::spawn_blocking(move || recompress(&bytes, max_width, max_height, quality));

        let encoded = match tokio::time::timeout(self.config.timeout, job).await {
            Err(_) => {
                warn!(timeout = ?self.config.timeout, "Transcoding timed out, uploading original");
                return Ok(self.keep_original(raw, TranscodeDecision::Timeout));
            }
            Ok(Err(join_err)) => {
                warn!(error = %join_err, "Transcoding task failed, uploading original");
                return Ok(self.keep_original(raw, TranscodeDecision::DecodeError));
            }
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "Could not transcode, uploading original");
                return Ok(self.keep_original(raw, TranscodeDecision::DecodeError));
            }
            Ok(Ok(Ok(encoded))) => encoded,
        };

        if encoded.bytes.len() >= raw.len() {
            debug!(output = encoded.bytes.len(), "Re-encoded output not smaller");
            return Ok(self.keep_original(raw, TranscodeDecision::NotSmaller));
        }

        let report = CompressionReport::new(
            raw.len(),
            encoded.bytes.len(),
            started.elapsed(),
            (encoded.width, encoded.height),
        );
        info!(
            decision = TranscodeDecision::Recompressed.as_str(),
            original = report.original_bytes,
            compressed = report.compressed_bytes,
            reduction = format!("{:.1}%", report.reduction_percent),
            "Photo recompressed"
        );

        Ok(TranscodeResult {
            asset: ProcessedAsset::recompressed(raw, encoded.bytes),
            report: Some(report),
            decision: TranscodeDecision::Recompressed,
        })
    }

    fn keep_original(&self, raw: &RawAsset, decision: TranscodeDecision) -> TranscodeResult {
        debug!(decision = decision.as_str(), "Keeping original bytes");
        TranscodeResult {
            asset: ProcessedAsset::passthrough(raw),
            report: None,
            decision,
        }
    }
}

/// Map a (0, 1] quality factor to the encoder's 1..=100 scale.
pub fn jpeg_quality(factor: f32) -> u8 {
    (factor * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Decode, fit within the bounds and encode as JPEG. CPU bound.
pub fn recompress(data: &[u8], max_width: u32, max_height: u32, quality: u8) -> Result<Encoded> {
    let img = image::load_from_memory(data)?;
    let (width, height) = fit_within(img.width(), img.height(), max_width, max_height);

    let resized = if (width, height) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(width, height, FilterType::Lanczos3)
    };

    let bytes = encode_jpeg(resized, quality)?;
    Ok(Encoded { bytes, width, height })
}

pub(crate) fn encode_jpeg(img: DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let img = to_jpeg_compatible(img);
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageOutputFormat::Jpeg(quality))?;
    Ok(buffer.into_inner())
}

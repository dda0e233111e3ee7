//! Small previews for immediate feedback.
//!
//! Independent of the transcoder: a preview is always built from the original
//! bytes and never waits on recompression.

use crate::asset::RawAsset;
use crate::dims::fit_longest_edge;
use crate::transcode::{encode_jpeg, jpeg_quality};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use photopost_core::config::PreviewConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Why no preview could be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    #[error("Preview generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Preview unavailable: {0}")]
    Decode(String),
}

/// A downscaled JPEG rendition of the upload.
#[derive(Debug, Clone)]
pub struct Preview {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Preview {
    /// `data:image/jpeg;base64,...` rendering for inline display.
    pub fn data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&self.bytes))
    }
}

/// Build a preview no larger than `config.max_edge` on its longer side.
#[instrument(skip_all, fields(file = %raw.file_name()))]
pub async fn generate_preview(raw: &RawAsset, config: &PreviewConfig) -> Result<Preview, PreviewError> {
    let bytes = raw.shared_bytes();
    let max_edge = config.max_edge;
    let quality = jpeg_quality(config.quality);

    let job = tokio::task::spawn_blocking(move || render(&bytes, max_edge, quality));

    match tokio::time::timeout(config.timeout, job).await {
        Err(_) => {
            warn!(timeout = ?config.timeout, "Preview generation timed out");
            Err(PreviewError::Timeout(config.timeout))
        }
        Ok(Err(join_err)) => Err(PreviewError::Decode(join_err.to_string())),
        Ok(Ok(result)) => {
            if let Ok(preview) = &result {
                debug!(width = preview.width, height = preview.height, "Preview ready");
            }
            result
        }
    }
}

fn render(data: &[u8], max_edge: u32, quality: u8) -> Result<Preview, PreviewError> {
    let img = image::load_from_memory(data).map_err(|e| PreviewError::Decode(e.to_string()))?;
    let (width, height) = fit_longest_edge(img.width(), img.height(), max_edge);

    let scaled = if (width, height) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(width, height, FilterType::Triangle)
    };

    let bytes = encode_jpeg(scaled, quality).map_err(|e| PreviewError::Decode(e.to_string()))?;
    Ok(Preview { bytes, width, height })
}

//! Upload payloads before and after transcoding.

use crate::{detect_format, ImageFormat, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Fallback media type when neither magic bytes nor extension are recognised.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// The file exactly as the user selected it.
///
/// Cloning shares the payload.
#[derive(Debug, Clone)]
pub struct RawAsset {
    bytes: Arc<[u8]>,
    media_type: String,
    file_name: String,
}

impl RawAsset {
    /// Wrap bytes with a declared media type.
    pub fn new(bytes: impl Into<Arc<[u8]>>, media_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
            file_name: file_name.into(),
        }
    }

    /// Read a file from disk, declaring its media type from magic bytes or,
    /// failing that, from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let media_type = detect_format(&bytes)
            .ok()
            .or_else(|| path.extension().and_then(|e| e.to_str()).and_then(ImageFormat::from_extension))
            .map_or(OCTET_STREAM, |f| f.mime_type());
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());

        Ok(Self::new(bytes, media_type, file_name))
    }

    /// Encoded payload.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the payload, for work moved off the executor.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Declared media type.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Original file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the declared media type is an image type.
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// The payload that will actually be uploaded.
#[derive(Debug, Clone)]
pub struct ProcessedAsset {
    bytes: Arc<[u8]>,
    media_type: String,
    file_name: String,
    changed: bool,
}

impl ProcessedAsset {
    /// Upload the original unchanged.
    pub fn passthrough(raw: &RawAsset) -> Self {
        Self {
            bytes: raw.shared_bytes(),
            media_type: raw.media_type.clone(),
            file_name: raw.file_name.clone(),
            changed: false,
        }
    }

    /// Substitute a recompressed JPEG; the file name gets a `.jpg` extension.
    pub fn recompressed(raw: &RawAsset, jpeg: Vec<u8>) -> Self {
        let stem = Path::new(&raw.file_name)
            .file_stem()
            .map_or_else(|| "upload".to_string(), |s| s.to_string_lossy().into_owned());

        Self {
            bytes: jpeg.into(),
            media_type: ImageFormat::Jpeg.mime_type().to_string(),
            file_name: format!("{stem}.jpg"),
            changed: true,
        }
    }

    /// Encoded payload.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the payload.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Media type of the payload.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// File name to upload under.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether this differs from the original.
    pub fn is_changed(&self) -> bool {
        self.changed
    }
}

/// Statistics for a substitution that actually happened.
#[derive(Debug, Clone, Serialize)]
pub struct CompressionReport {
    /// Input size in bytes
    pub original_bytes: usize,
    /// Output size in bytes
    pub compressed_bytes: usize,
    /// `(1 - compressed / original) * 100`
    pub reduction_percent: f64,
    /// Wall time spent on decode, resample and encode
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

impl CompressionReport {
    pub(crate) fn new(original_bytes: usize, compressed_bytes: usize, elapsed: Duration, (width, height): (u32, u32)) -> Self {
        let reduction_percent = if original_bytes == 0 {
            0.0
        } else {
            (1.0 - compressed_bytes as f64 / original_bytes as f64) * 100.0
        };

        Self {
            original_bytes,
            compressed_bytes,
            reduction_percent,
            elapsed,
            width,
            height,
        }
    }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_passthrough_shares_original() {
        let raw = RawAsset::new(vec![1u8, 2, 3], "image/png", "beach.png");
        let processed = ProcessedAsset::passthrough(&raw);
        assert!(!processed.is_changed());
        assert_eq!(processed.bytes(), raw.bytes());
        assert_eq!(processed.media_type(), "image/png");
        assert_eq!(processed.file_name(), "beach.png");
    }

    #[test]
    fn test_recompressed_renames_to_jpg() {
        let raw = RawAsset::new(vec![0u8; 10], "image/png", "beach.final.png");
        let processed = ProcessedAsset::recompressed(&raw, vec![0xFF, 0xD8]);
        assert!(processed.is_changed());
        assert_eq!(processed.media_type(), "image/jpeg");
        assert_eq!(processed.file_name(), "beach.final.jpg");
        assert_eq!(processed.len(), 2);
    }

    #[test]
    fn test_report_percentage() {
        let report = CompressionReport::new(2000, 500, Duration::from_millis(40), (800, 600));
        assert!((report.reduction_percent - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_path_uses_magic_then_extension() {
        let dir = tempfile::tempdir().unwrap();

        let png_path = dir.path().join("mislabelled.jpg");
        std::fs::File::create(&png_path)
            .unwrap()
            .write_all(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
            .unwrap();
        let raw = RawAsset::from_path(&png_path).unwrap();
        assert_eq!(raw.media_type(), "image/png");
        assert_eq!(raw.file_name(), "mislabelled.jpg");

        let heic_path = dir.path().join("IMG_0001.HEIC");
        std::fs::write(&heic_path, b"not really").unwrap();
        assert_eq!(RawAsset::from_path(&heic_path).unwrap().media_type(), "image/heic");

        let txt_path = dir.path().join("notes.txt");
        std::fs::write(&txt_path, b"hello world").unwrap();
        let raw = RawAsset::from_path(&txt_path).unwrap();
        assert_eq!(raw.media_type(), OCTET_STREAM);
        assert!(!raw.is_image());
    }
}

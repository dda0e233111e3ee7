//! Dimension probing and fitting.
//!
//! Probing reads the header only, so reports can be built without decoding
//! the full image.

use crate::{detect_format, ImageFormat};
use serde::{Deserialize, Serialize};

/// Header-level facts about an encoded image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Encoded size in bytes
    pub size_bytes: usize,
}

impl ImageInfo {
    /// Whether the image already fits within `max_width` x `max_height`.
    pub fn fits_within(&self, max_width: u32, max_height: u32) -> bool {
        self.width <= max_width && self.height <= max_height
    }
}

/// Probe format and dimensions from encoded bytes.
///
/// Returns `None` for formats whose header is not parsed here (WebP, HEIC)
/// or for truncated data.
pub fn probe(data: &[u8]) -> Option<ImageInfo> {
    let format = detect_format(data).ok()?;

    let (width, height) = match format {
        ImageFormat::Jpeg => jpeg_dimensions(data)?,
        ImageFormat::Png => png_dimensions(data)?,
        ImageFormat::Gif => gif_dimensions(data)?,
        ImageFormat::WebP | ImageFormat::Heic => return None,
    };

    Some(ImageInfo {
        width,
        height,
        format,
        size_bytes: data.len(),
    })
}

/// Scale `(width, height)` uniformly so neither side exceeds the bounds.
///
/// The ratio is `min(max_width / width, max_height / height)`, capped at 1 so
/// images are never upscaled. Results are rounded and never below 1 pixel.
///
/// # Example
/// ```
/// use photopost_image::fit_within;
///
/// assert_eq!(fit_within(4000, 3000, 1920, 1080), (1440, 1080));
/// assert_eq!(fit_within(800, 600, 1920, 1080), (800, 600));
/// ```
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let ratio = (f64::from(max_width) / f64::from(width))
        .min(f64::from(max_height) / f64::from(height))
        .min(1.0);

    if ratio >= 1.0 {
        return (width, height);
    }

    let scale = |side: u32| ((f64::from(side) * ratio).round() as u32).max(1);
    (scale(width), scale(height))
}

/// Scale so the longer side is at most `max_edge`, never upscaling.
pub fn fit_longest_edge(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    fit_within(width, height, max_edge, max_edge)
}

fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    // Skip SOI
    let mut i = 2;

    while i + 4 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];

        // SOFn frames carry the dimensions; DHT/JPG/DAC share the range
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) && i + 9 < data.len() {
            let height = u32::from(u16::from_be_bytes([data[i + 5], data[i + 6]]));
            let width = u32::from(u16::from_be_bytes([data[i + 7], data[i + 8]]));
            return Some((width, height));
        }

        match marker {
            0xFF => i += 1,
            0xD0..=0xD9 | 0x01 => i += 2,
            _ => {
                let length = usize::from(u16::from_be_bytes([data[i + 2], data[i + 3]]));
                i += 2 + length;
            }
        }
    }

    None
}

fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    // 8-byte signature, then IHDR: length, "IHDR", width, height
    if data.len() < 24 || &data[12..16] != b"IHDR" {
        return None;
    }

    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    Some((width, height))
}

fn gif_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 10 {
        return None;
    }

    let width = u32::from(u16::from_le_bytes([data[6], data[7]]));
    let height = u32::from(u16::from_le_bytes([data[8], data[9]]));
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, RgbImage};
    use std::io::Cursor;

    fn encode(width: u32, height: u32, format: ImageOutputFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_fit_within_landscape_and_portrait() {
        assert_eq!(fit_within(4000, 3000, 1920, 1080), (1440, 1080));
        assert_eq!(fit_within(3000, 4000, 1920, 1080), (810, 1080));
        assert_eq!(fit_within(4000, 1000, 1920, 1080), (1920, 480));
    }

    #[test]
    fn test_fit_within_never_upscales() {
        assert_eq!(fit_within(640, 480, 1920, 1080), (640, 480));
        assert_eq!(fit_within(1920, 1080, 1920, 1080), (1920, 1080));
        assert_eq!(fit_longest_edge(300, 200, 400), (300, 200));
    }

    #[test]
    fn test_fit_within_keeps_one_pixel() {
        assert_eq!(fit_within(10_000, 1, 400, 400), (400, 1));
        assert_eq!(fit_within(0, 10, 400, 400), (0, 10));
    }

    #[test]
    fn test_fit_longest_edge() {
        assert_eq!(fit_longest_edge(1200, 900, 400), (400, 300));
        assert_eq!(fit_longest_edge(900, 1200, 400), (300, 400));
    }

    #[test]
    fn test_probe_encoded_headers() {
        let jpeg = probe(&encode(320, 240, ImageOutputFormat::Jpeg(80))).unwrap();
        assert_eq!((jpeg.width, jpeg.height, jpeg.format), (320, 240, ImageFormat::Jpeg));

        let png = probe(&encode(33, 17, ImageOutputFormat::Png)).unwrap();
        assert_eq!((png.width, png.height, png.format), (33, 17, ImageFormat::Png));
        assert!(png.fits_within(1920, 1080));
    }

    #[test]
    fn test_probe_truncated() {
        assert!(probe(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]).is_none());
        assert!(probe(b"RIFF\x00\x00\x00\x00WEBP").is_none());
    }
}

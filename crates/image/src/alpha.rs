//! Alpha flattening ahead of JPEG encoding.

use image::{DynamicImage, Rgb, RgbImage};

/// Background used when flattening transparent uploads.
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Composite `img` over a solid background, dropping the alpha channel.
pub fn flatten_alpha(img: &DynamicImage, background: [u8; 3]) -> DynamicImage {
    let rgba = img.to_rgba8();
    let mut output = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = f32::from(a) / 255.0;
        let blend = |fg: u8, bg: u8| (f32::from(fg) * alpha + f32::from(bg) * (1.0 - alpha)).round() as u8;

        output.put_pixel(
            x,
            y,
            Rgb([blend(r, background[0]), blend(g, background[1]), blend(b, background[2])]),
        );
    }

    DynamicImage::ImageRgb8(output)
}

/// Check if an image has an alpha channel
pub fn has_alpha_channel(img: &DynamicImage) -> bool {
    img.color().has_alpha()
}

/// Convert to a colour layout the JPEG encoder accepts.
pub(crate) fn to_jpeg_compatible(img: DynamicImage) -> DynamicImage {
    if has_alpha_channel(&img) {
        flatten_alpha(&img, WHITE)
    } else {
        match img {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => img,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        }
    }
}

//! Deterministic fixtures for image tests.

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

/// Linear congruential pixel noise; compresses poorly, so sizes are predictable.
pub fn noise_rgb(width: u32, height: u32, seed: u32) -> RgbImage {
    let mut state = seed;
    RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        };
        Rgb([next(), next(), next()])
    })
}

pub fn encode(img: DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub fn noise_jpeg(width: u32, height: u32, quality: u8) -> Vec<u8> {
    encode(DynamicImage::ImageRgb8(noise_rgb(width, height, 7)), ImageOutputFormat::Jpeg(quality))
}

pub fn flat_png(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 140, 200]))),
        ImageOutputFormat::Png,
    )
}

pub fn translucent_png(width: u32, height: u32) -> Vec<u8> {
    let mut state = 11u32;
    let img = RgbaImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let v = (state >> 24) as u8;
        Rgba([v, v / 2, 255 - v, v])
    });
    encode(DynamicImage::ImageRgba8(img), ImageOutputFormat::Png)
}

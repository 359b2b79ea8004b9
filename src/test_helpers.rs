//! Shared test utilities: synthetic images and fixture files.
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let input = tmp.path().join("portrait.png");
//! write_png(&input, &gradient_image(1200, 1200));
//! ```

use image::{ImageFormat, Rgb, RgbImage};
use std::path::Path;

// =========================================================================
// Synthetic images
// =========================================================================

/// An image where every pixel differs from its neighbours, so crops and
/// offsets can be checked pixel by pixel.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x % 256) as u8,
            (y % 256) as u8,
            ((x / 256 + y / 256 * 7) % 256) as u8,
        ])
    })
}

/// A single-colour image.
pub fn solid_image(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

// =========================================================================
// Fixture files
// =========================================================================

/// Write `image` as a PNG at `path`.
pub fn write_png(path: &Path, image: &RgbImage) {
    image.save_with_format(path, ImageFormat::Png).unwrap();
}

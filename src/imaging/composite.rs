//! Foreground masks and compositing onto a white background.
//!
//! The segmentation model decides what is subject and what is background; the
//! only logic here is how its continuous alpha is blended against white:
//!
//! ```text
//! out = alpha * pixel + (1 - alpha) * 255
//! ```
//!
//! Alpha is never thresholded, so soft edges (hair, shoulders) survive.

use super::error::ImagingError;
use super::params::Dimensions;
use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage, RgbaImage};

/// Single-channel `f32` plane holding alpha values.
pub type AlphaPlane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Per-pixel foreground opacity in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    plane: AlphaPlane,
}

impl Mask {
    /// Wrap an alpha plane, clamping every value into `[0, 1]`.
    ///
    /// NaN is treated as fully transparent.
    pub fn new(mut plane: AlphaPlane) -> Self {
        for pixel in plane.pixels_mut() {
            let value = pixel.0[0];
            pixel.0[0] = if value.is_nan() {
                0.0
            } else {
                value.clamp(0.0, 1.0)
            };
        }
        Self { plane }
    }

    /// Mask from an 8-bit grayscale image (0 = background, 255 = foreground).
    pub fn from_luma8(gray: &GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        Self {
            plane: ImageBuffer::from_fn(width, height, |x, y| {
                Luma([gray.get_pixel(x, y).0[0] as f32 / 255.0])
            }),
        }
    }

    /// Mask from the alpha channel of a cut-out image.
    pub fn from_rgba_alpha(rgba: &RgbaImage) -> Self {
        let (width, height) = rgba.dimensions();
        Self {
            plane: ImageBuffer::from_fn(width, height, |x, y| {
                Luma([rgba.get_pixel(x, y).0[3] as f32 / 255.0])
            }),
        }
    }

    /// Everything is foreground.
    pub fn opaque(width: u32, height: u32) -> Self {
        Self {
            plane: ImageBuffer::from_pixel(width, height, Luma([1.0])),
        }
    }

    /// Everything is background.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            plane: ImageBuffer::from_pixel(width, height, Luma([0.0])),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        let (width, height) = self.plane.dimensions();
        Dimensions { width, height }
    }

    pub fn alpha(&self, x: u32, y: u32) -> f32 {
        self.plane.get_pixel(x, y).0[0]
    }

    /// Soften the mask edge with a Gaussian blur of standard deviation `sigma`.
    ///
    /// `sigma <= 0` returns the mask unchanged.
    pub fn feathered(self, sigma: f32) -> Self {
        if sigma <= 0.0 || !sigma.is_finite() {
            return self;
        }
        Self::new(image::imageops::blur(&self.plane, sigma))
    }

    pub fn as_plane(&self) -> &AlphaPlane {
        &self.plane
    }
}

/// Composite `image` over solid white using `mask` as foreground opacity.
///
/// # Errors
/// [`ImagingError::DimensionMismatch`] when the mask was produced for an image
/// of a different size.
pub fn composite_on_white(image: &RgbImage, mask: &Mask) -> Result<RgbImage, ImagingError> {
    let expected = Dimensions::of(image);
    let actual = mask.dimensions();
    if expected != actual {
        return Err(ImagingError::DimensionMismatch {
            what: "foreground mask",
            expected,
            actual,
        });
    }

    Ok(RgbImage::from_fn(expected.width, expected.height, |x, y| {
        let alpha = mask.alpha(x, y);
        let Rgb(channels) = *image.get_pixel(x, y);
        Rgb(channels.map(|c| blend_over_white(c, alpha)))
    }))
}

#[inline]
fn blend_over_white(channel: u8, alpha: f32) -> u8 {
    let value = alpha * channel as f32 + (1.0 - alpha) * 255.0;
    value.round().clamp(0.0, 255.0) as u8
}

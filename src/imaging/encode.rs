//! Final resampling and JPEG encoding with DPI metadata.
//!
//! | Step | Crate / function |
//! |---|---|
//! | Resample | `image::imageops::resize` with `Lanczos3` |
//! | Encode | `image::codecs::jpeg::JpegEncoder` |
//! | DPI | JFIF APP0 density via `JpegEncoder::set_pixel_density` |
//!
//! Print labs use the JFIF density to decide the physical size of the print,
//! so the DPI is written into every photo and sheet rather than left at the
//! encoder's 72 DPI default.

use super::error::ImagingError;
use super::params::{Dimensions, Quality};
use crate::standards::Standard;
use image::RgbImage;
use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::imageops::FilterType;
use tracing::{debug, warn};

/// An encoded JPEG together with the facts embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPhoto {
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
    pub dpi: u16,
}

/// Resample a cropped, background-cleaned image to the standard's exact size
/// and encode it.
///
/// The input is expected to already have the standard's aspect ratio. Because
/// undersized sources are rejected up front, any upscaling here is at most the
/// pixel or so lost to crop rounding.
pub fn finalize(
    image: &RgbImage,
    standard: &Standard,
    quality: Quality,
) -> Result<EncodedPhoto, ImagingError> {
    let source = Dimensions::of(image);
    let (width, height) = standard.size();

    if source.height > 0 {
        let drift = (source.width as f64 / source.height as f64 - standard.aspect_ratio()).abs();
        if drift > 0.01 {
            warn!(
                %source,
                standard = %standard.code,
                drift,
                "Finalizing an image whose aspect ratio differs from the standard"
            );
        }
    }

    let resized = if source == Dimensions::new(width, height) {
        image.clone()
    } else {
        debug!(%source, width, height, "Resampling with Lanczos3");
        image::imageops::resize(image, width, height, FilterType::Lanczos3)
    };

    encode_jpeg(&resized, standard.dpi, quality)
}

/// Encode an RGB image as JPEG with a JFIF density of `dpi` dots per inch.
///
/// JFIF stores the density in 16 bits; larger values are an
/// [`ImagingError::UnsupportedDpi`] rather than a clamped header.
pub fn encode_jpeg(image: &RgbImage, dpi: u32, quality: Quality) -> Result<EncodedPhoto, ImagingError> {
    let dpi = u16::try_from(dpi).map_err(|_| ImagingError::UnsupportedDpi { dpi })?;
    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.value());
        encoder.set_pixel_density(PixelDensity::dpi(dpi));
        encoder.encode_image(image)?;
    }

    Ok(EncodedPhoto {
        bytes,
        dimensions: Dimensions::of(image),
        dpi,
    })
}

/// Read the JFIF pixel density of a JPEG as dots per inch.
///
/// Returns `None` when the data has no JFIF header or the density has no
/// physical unit (aspect-ratio only). Dots per centimetre are converted.
pub fn read_jpeg_dpi(bytes: &[u8]) -> Option<(u16, u16)> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        // Start of scan: no more header segments
        if marker == 0xDA {
            return None;
        }
        let length = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        let segment = bytes.get(pos + 4..pos + 2 + length)?;

        if marker == 0xE0 && segment.len() >= 12 && segment.starts_with(b"JFIF\0") {
            let unit = segment[7];
            let x = u16::from_be_bytes([segment[8], segment[9]]);
            let y = u16::from_be_bytes([segment[10], segment[11]]);
            return match unit {
                1 => Some((x, y)),
                2 => Some((per_cm_to_dpi(x), per_cm_to_dpi(y))),
                _ => None,
            };
        }
        pos += 2 + length;
    }
    None
}

fn per_cm_to_dpi(value: u16) -> u16 {
    (value as f64 * 2.54).round().min(u16::MAX as f64) as u16
}

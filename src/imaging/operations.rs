//! High-level image operations.
//!
//! These functions combine the pure calculations with pixel work on in-memory
//! buffers. Each returns a fresh image; inputs are never modified.

use super::calculations::{SheetLayout, calculate_crop_rect, calculate_sheet_layout};
use super::encode::{EncodedPhoto, encode_jpeg};
use super::error::ImagingError;
use super::params::{BoundingBox, CropRect, Dimensions, Quality};
use crate::standards::Standard;
use image::{Rgb, RgbImage};
use tracing::debug;

/// Crop rectangle for `standard`, optionally centered on a detected face.
pub fn plan_crop(source: Dimensions, standard: &Standard, face: Option<&BoundingBox>) -> CropRect {
    calculate_crop_rect(source, standard.aspect_ratio(), face)
}

/// Copy the pixels inside `rect` into a new image. No resampling.
///
/// The rectangle is clamped to the image, so the result never reads outside
/// the source even for a hand-made rectangle.
pub fn apply_crop(image: &RgbImage, rect: CropRect) -> RgbImage {
    let (width, height) = image.dimensions();
    let x = rect.x.min(width);
    let y = rect.y.min(height);
    let w = rect.width.min(width - x);
    let h = rect.height.min(height - y);
    image::imageops::crop_imm(image, x, y, w, h).to_image()
}

/// Sheet layout for a finished photo of `standard`.
pub fn plan_sheet(standard: &Standard, copies: Option<u32>) -> Result<SheetLayout, ImagingError> {
    calculate_sheet_layout(
        Dimensions::new(standard.width_px, standard.height_px),
        Dimensions::new(standard.sheet.width_px, standard.sheet.height_px),
        copies.unwrap_or(standard.sheet.copies),
    )
}

/// An encoded print sheet and the number of copies actually placed on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSheet {
    pub sheet: EncodedPhoto,
    /// Never more than the sheet's grid capacity, even when more were asked for.
    pub copies: u32,
}

/// Tile copies of a finished photo onto a white sheet and encode it.
///
/// `copies` overrides the standard's copies-per-sheet.
///
/// # Errors
/// - [`ImagingError::DimensionMismatch`] if `photo` is not exactly the
///   standard's target size.
/// - [`ImagingError::Layout`] if the photo does not fit on the sheet.
/// - [`ImagingError::Encode`] if the JPEG encoder fails.
pub fn compose_sheet(
    photo: &RgbImage,
    standard: &Standard,
    copies: Option<u32>,
    quality: Quality,
) -> Result<EncodedSheet, ImagingError> {
    let (canvas, layout) = render_sheet(photo, standard, copies)?;
    Ok(EncodedSheet {
        sheet: encode_jpeg(&canvas, standard.dpi, quality)?,
        copies: layout.placed() as u32,
    })
}

/// Tile copies of a finished photo onto a white sheet without encoding it.
/// Returns the canvas with the layout that was used.
pub fn render_sheet(
    photo: &RgbImage,
    standard: &Standard,
    copies: Option<u32>,
) -> Result<(RgbImage, SheetLayout), ImagingError> {
    let expected = Dimensions::new(standard.width_px, standard.height_px);
    let actual = Dimensions::of(photo);
    if actual != expected {
        return Err(ImagingError::DimensionMismatch {
            what: "sheet photo",
            expected,
            actual,
        });
    }

    let layout = plan_sheet(standard, copies)?;
    debug!(
        columns = layout.columns,
        rows = layout.rows,
        placed = layout.placed(),
        margin_left = layout.margin_left,
        margin_top = layout.margin_top,
        "Sheet layout"
    );

    let mut canvas = RgbImage::from_pixel(
        standard.sheet.width_px,
        standard.sheet.height_px,
        Rgb([255, 255, 255]),
    );
    for &(x, y) in &layout.positions {
        image::imageops::replace(&mut canvas, photo, x as i64, y as i64);
    }
    Ok((canvas, layout))
}

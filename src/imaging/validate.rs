//! Resolution gate run before anything touches the pixels.

use super::error::ImagingError;
use super::params::Dimensions;
use crate::standards::Standard;

/// Reject images smaller than the standard's minimum in either direction.
///
/// Only the pixel dimensions are inspected. Undersized images are never
/// upscaled: the caller has to supply a higher-resolution source.
pub fn validate_dimensions(actual: Dimensions, standard: &Standard) -> Result<(), ImagingError> {
    if actual.width < standard.min_width_px || actual.height < standard.min_height_px {
        return Err(ImagingError::RejectedTooSmall {
            standard: standard.code.clone(),
            actual,
            minimum: Dimensions::new(standard.min_width_px, standard.min_height_px),
        });
    }
    Ok(())
}

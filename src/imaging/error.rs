use super::params::Dimensions;
use thiserror::Error;

/// Failures of the imaging stages.
///
/// `RejectedTooSmall` is the only one caused by user input. The dimension and
/// layout variants point at a misconfigured standard or broken wiring between
/// stages, and `Encode` at the codec.
#[derive(Error, Debug)]
pub enum ImagingError {
    #[error(
        "Image is {actual} but the '{standard}' standard needs at least {minimum}. \
         Please use a higher-resolution photo."
    )]
    RejectedTooSmall {
        standard: String,
        actual: Dimensions,
        minimum: Dimensions,
    },
    #[error("{what} is {actual} but {expected} was expected")]
    DimensionMismatch {
        what: &'static str,
        expected: Dimensions,
        actual: Dimensions,
    },
    #[error("A {photo} photo does not fit on a {sheet} sheet")]
    Layout { photo: Dimensions, sheet: Dimensions },
    #[error("{dpi} DPI cannot be stored in a JPEG header (maximum 65535)")]
    UnsupportedDpi { dpi: u32 },
    #[error("Encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

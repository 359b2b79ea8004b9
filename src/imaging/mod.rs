//! Image processing: pure Rust, in-memory buffers only.
//!
//! | Stage | Function |
//! |---|---|
//! | **Validate** | [`validate_dimensions`] |
//! | **Crop** | [`plan_crop`] + [`apply_crop`] |
//! | **Composite** | [`composite_on_white`] with a [`Mask`] |
//! | **Finalize** | [`finalize`]: Lanczos3 resample + JPEG with DPI |
//! | **Sheet** | [`compose_sheet`] |
//!
//! The module is split into:
//! - **Calculations**: pure geometry for crops and sheet grids (unit testable)
//! - **Parameters**: value types shared by the stages
//! - **Composite / Encode / Validate**: one stage each
//! - **Operations**: high-level functions combining calculations + pixels

mod calculations;
mod composite;
mod encode;
mod error;
pub mod operations;
mod params;
mod validate;

pub use calculations::{SheetLayout, calculate_crop_rect, calculate_sheet_layout};
pub use composite::{AlphaPlane, Mask, composite_on_white};
pub use encode::{EncodedPhoto, encode_jpeg, finalize, read_jpeg_dpi};
pub use error::ImagingError;
pub use operations::{EncodedSheet, apply_crop, compose_sheet, plan_crop, plan_sheet, render_sheet};
pub use params::{BoundingBox, CropRect, Dimensions, Quality};
pub use validate::validate_dimensions;

//! Model adapters: face detection and foreground segmentation.
//!
//! The pipeline only talks to the two traits defined here, so it never knows
//! which engine produced a face box or a mask.
//!
//! | Trait | Implementation | Availability |
//! |---|---|---|
//! | [`Segmenter`] | [`CommandSegmenter`]: external program such as `rembg` | always |
//! | [`Segmenter`] | `OnnxSegmenter`: ISNet / U2-Net through ONNX Runtime | `onnx` feature |
//! | [`FaceDetector`] | `RustfaceDetector`: SeetaFace frontal cascade | `rustface` feature |
//!
//! Both builders read the relevant `passport.toml` section and fail with
//! [`ModelError::Unavailable`] when the requested engine was not compiled in
//! or is missing its model file.

mod command;
#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "rustface")]
mod rustface;

pub use command::CommandSegmenter;
#[cfg(feature = "onnx")]
pub use onnx::OnnxSegmenter;
#[cfg(feature = "rustface")]
pub use rustface::RustfaceDetector;

use crate::config::{FaceDetectionConfig, SegmentationBackend, SegmentationConfig};
use crate::imaging::{BoundingBox, Mask};
use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Model unavailable: {0}")]
    Unavailable(String),
    #[error("Model failed: {0}")]
    ProcessingFailed(String),
}

/// Locates the subject's face.
pub trait FaceDetector: Sync {
    /// The most prominent face, or `None` when no face is found.
    fn detect(&self, image: &RgbImage) -> Result<Option<BoundingBox>, ModelError>;
}

/// Separates the subject from the background.
pub trait Segmenter: Sync {
    /// Foreground mask with the same dimensions as `image`.
    fn segment(&self, image: &RgbImage) -> Result<Mask, ModelError>;
}

/// Pick the face with the largest area. Ties keep the first candidate.
pub fn largest_face(faces: impl IntoIterator<Item = BoundingBox>) -> Option<BoundingBox> {
    faces.into_iter().fold(None, |best, face| match best {
        Some(b) if b.area() >= face.area() => Some(b),
        _ => Some(face),
    })
}

/// Build the segmenter selected in `[segmentation]`.
pub fn build_segmenter(config: &SegmentationConfig) -> Result<Box<dyn Segmenter>, ModelError> {
    match config.backend {
        SegmentationBackend::Command => Ok(Box::new(CommandSegmenter::from_config(config))),
        SegmentationBackend::Onnx => build_onnx_segmenter(config),
    }
}

#[cfg(feature = "onnx")]
fn build_onnx_segmenter(config: &SegmentationConfig) -> Result<Box<dyn Segmenter>, ModelError> {
    let model = config.model.as_deref().ok_or_else(|| {
        ModelError::Unavailable("segmentation.model is not set".to_string())
    })?;
    Ok(Box::new(OnnxSegmenter::new(model, config.input_size)?))
}

#[cfg(not(feature = "onnx"))]
fn build_onnx_segmenter(_config: &SegmentationConfig) -> Result<Box<dyn Segmenter>, ModelError> {
    Err(ModelError::Unavailable(
        "the onnx segmentation backend is not compiled in (enable the `onnx` feature)".to_string(),
    ))
}

/// Build the face detector configured in `[face_detection]`.
#[cfg(feature = "rustface")]
pub fn build_face_detector(
    config: &FaceDetectionConfig,
) -> Result<Box<dyn FaceDetector>, ModelError> {
    let model = config.model.as_deref().ok_or_else(|| {
        ModelError::Unavailable("face_detection.model is not set".to_string())
    })?;
    Ok(Box::new(RustfaceDetector::new(model, config.min_face_size)?))
}

/// Build the face detector configured in `[face_detection]`.
#[cfg(not(feature = "rustface"))]
pub fn build_face_detector(
    _config: &FaceDetectionConfig,
) -> Result<Box<dyn FaceDetector>, ModelError> {
    Err(ModelError::Unavailable(
        "face detection is not compiled in (enable the `rustface` feature)".to_string(),
    ))
}

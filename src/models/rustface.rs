//! Frontal face detection with the SeetaFace cascade from `rustface`.
//!
//! A detector is built for every call: `rustface` detectors hold mutable
//! state and are not shared across the worker pool.

use super::{FaceDetector, ModelError, largest_face};
use crate::imaging::BoundingBox;
use image::RgbImage;
use rustface::ImageData;
use std::path::{Path, PathBuf};
use tracing::debug;

const SCORE_THRESHOLD: f64 = 2.0;
const PYRAMID_SCALE_FACTOR: f32 = 0.8;
const SLIDE_WINDOW_STEP: u32 = 4;

pub struct RustfaceDetector {
    model: PathBuf,
    min_face_size: u32,
}

impl RustfaceDetector {
    pub fn new(model: &Path, min_face_size: u32) -> Result<Self, ModelError> {
        if !model.exists() {
            return Err(ModelError::Unavailable(format!(
                "face detection model not found: {}",
                model.display()
            )));
        }
        Ok(Self {
            model: model.to_path_buf(),
            min_face_size,
        })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, image: &RgbImage) -> Result<Option<BoundingBox>, ModelError> {
        let mut detector = rustface::create_detector(&self.model.to_string_lossy())
            .map_err(|e| ModelError::Unavailable(format!("loading {}: {e}", self.model.display())))?;
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(SCORE_THRESHOLD);
        detector.set_pyramid_scale_factor(PYRAMID_SCALE_FACTOR);
        detector.set_slide_window_step(SLIDE_WINDOW_STEP, SLIDE_WINDOW_STEP);

        let gray = image::imageops::grayscale(image);
        let mut data = ImageData::new(gray.as_raw(), gray.width(), gray.height());
        let faces = detector.detect(&mut data);
        debug!(count = faces.len(), "Faces detected");

        Ok(largest_face(faces.iter().map(|face| {
            let bbox = face.bbox();
            BoundingBox {
                x: bbox.x() as f64,
                y: bbox.y() as f64,
                width: bbox.width() as f64,
                height: bbox.height() as f64,
            }
        })))
    }
}

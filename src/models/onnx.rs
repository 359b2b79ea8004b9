//! In-process segmentation with an ISNet / U2-Net style ONNX model.
//!
//! | Step | Detail |
//! |---|---|
//! | Resize | Lanczos3 to `input_size × input_size` |
//! | Normalise | `pixel / 255 - 0.5`, NCHW `[1, 3, n, n]` |
//! | Inference | first output, `[1, 1, n, n]` |
//! | Post-process | min-max stretch to `[0, 1]`, Triangle resize back |

use super::{ModelError, Segmenter};
use crate::imaging::{AlphaPlane, Mask};
use image::imageops::FilterType;
use image::RgbImage;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

const MEAN: f32 = 0.5;
const STD: f32 = 1.0;

pub struct OnnxSegmenter {
    session: Mutex<Session>,
    input_size: u32,
}

impl OnnxSegmenter {
    pub fn new(model_path: &Path, input_size: u32) -> Result<Self, ModelError> {
        if !model_path.exists() {
            return Err(ModelError::Unavailable(format!(
                "segmentation model not found: {}",
                model_path.display()
            )));
        }
        info!(model = %model_path.display(), input_size, "Loading segmentation model");
        let session = Session::builder()
            .and_then(|builder| builder.commit_from_file(model_path))
            .map_err(|e| ModelError::Unavailable(format!("loading {}: {e}", model_path.display())))?;
        Ok(Self {
            session: Mutex::new(session),
            input_size,
        })
    }

    fn preprocess(&self, image: &RgbImage) -> Vec<f32> {
        let n = self.input_size;
        let resized = image::imageops::resize(image, n, n, FilterType::Lanczos3);
        let plane = (n * n) as usize;
        let mut data = vec![0.0f32; 3 * plane];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let idx = (y * n + x) as usize;
            for c in 0..3 {
                data[c * plane + idx] = (pixel.0[c] as f32 / 255.0 - MEAN) / STD;
            }
        }
        data
    }
}

/// Stretch raw model output to `[0, 1]`. A flat output maps to zero.
fn normalize_prediction(raw: &[f32]) -> Vec<f32> {
    let (min, max) = raw
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if !range.is_finite() || range <= f32::EPSILON {
        return vec![0.0; raw.len()];
    }
    raw.iter().map(|v| (v - min) / range).collect()
}

impl Segmenter for OnnxSegmenter {
    fn segment(&self, image: &RgbImage) -> Result<Mask, ModelError> {
        let n = self.input_size;
        let input = Tensor::from_array(([1usize, 3, n as usize, n as usize], self.preprocess(image)))
            .map_err(|e| ModelError::ProcessingFailed(format!("building input tensor: {e}")))?;

        let prediction = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| ModelError::ProcessingFailed("model session poisoned".to_string()))?;
            let outputs = session
                .run(ort::inputs![input])
                .map_err(|e| ModelError::ProcessingFailed(format!("inference: {e}")))?;
            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| ModelError::ProcessingFailed(format!("reading output: {e}")))?;
            debug!(?shape, "Segmentation output");
            if data.len() != (n * n) as usize {
                return Err(ModelError::ProcessingFailed(format!(
                    "unexpected output shape {shape:?}"
                )));
            }
            normalize_prediction(data)
        };

        let small = AlphaPlane::from_raw(n, n, prediction).ok_or_else(|| {
            ModelError::ProcessingFailed("output does not fill the mask plane".to_string())
        })?;
        let (width, height) = image.dimensions();
        let full: AlphaPlane = image::imageops::resize(&small, width, height, FilterType::Triangle);
        Ok(Mask::new(full))
    }
}

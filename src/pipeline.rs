//! Per-file passport photo pipeline.
//!
//! ```text
//! decode → validate → [detect face] → crop → segment → feather → composite
//!        → finalize (resample + JPEG/DPI) → [sheet]
//! ```
//!
//! The stages themselves live in [`imaging`](crate::imaging) and the model
//! adapters in [`models`](crate::models); this module wires them together,
//! decides which failures are fatal, and writes the results.
//!
//! ## Failure policy
//!
//! | Stage | On failure |
//! |---|---|
//! | Decode / validate | file skipped, nothing written |
//! | Face detection | warning, centered crop |
//! | Segmentation | file fails |
//! | Encode / write | file fails, partial outputs removed |
//!
//! Every output is fully encoded in memory before the first byte is written.
//! Files are written to a temporary file in the output directory and renamed
//! into place, so an interrupted run never leaves a truncated JPEG behind.
//!
//! ## Batches
//!
//! [`Pipeline::process_batch`] runs files on the global rayon pool and returns
//! one [`FileReport`] per input, in input order. A failed file never stops the
//! batch.

use crate::config::AppConfig;
use crate::imaging::{
    BoundingBox, CropRect, Dimensions, EncodedPhoto, EncodedSheet, ImagingError, Quality,
    apply_crop, compose_sheet, composite_on_white, finalize, plan_crop, validate_dimensions,
};
use crate::models::{FaceDetector, ModelError, Segmenter};
use crate::naming::{input_stem, photo_file_name, sheet_file_name};
use crate::standards::{Standard, StandardRegistry};
use image::{ImageFormat, RgbImage};
use rayon::prelude::*;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Imaging(#[from] ImagingError),
    #[error("Processing failed: {0}")]
    ProcessingFailed(#[from] ModelError),
    #[error("Cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),
    #[error("{output} is already produced from {first}; rename one of the two inputs")]
    OutputCollision { output: PathBuf, first: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// True when the input itself was unusable: too small, unreadable,
    /// missing, or clashing with another input's output names.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PipelineError::Imaging(ImagingError::RejectedTooSmall { .. })
                | PipelineError::Decode { .. }
                | PipelineError::InputNotFound(_)
                | PipelineError::OutputCollision { .. }
        )
    }
}

/// Input extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Image file extensions picked up when a directory is given as input.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Expand command-line inputs into a list of image files.
///
/// Files are taken as given. Directories are walked recursively and
/// contribute every file with a supported extension, sorted by path. Outputs
/// of an earlier run for any standard in `registry` are skipped so a directory
/// can be processed in place.
///
/// Paths that do not exist are kept: they are reported as
/// [`PipelineError::InputNotFound`] for that one input when it is processed.
pub fn discover_inputs(inputs: &[PathBuf], registry: &StandardRegistry) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| has_supported_extension(path) && !is_pipeline_output(path, registry))
                .collect();
            debug!(dir = %input.display(), count = found.len(), "Discovered inputs");
            files.append(&mut found);
        } else {
            files.push(input.clone());
        }
    }
    files
}

/// True for `<stem>_<code>_passport` and `<stem>_<code>_passport_<label>`
/// with a known standard code and its sheet label.
fn is_pipeline_output(path: &Path, registry: &StandardRegistry) -> bool {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    registry.iter().any(|standard| {
        let photo = format!("_{}_passport", standard.code);
        let sheet = format!("{photo}_{}", standard.sheet.label);
        [photo, sheet]
            .iter()
            .any(|suffix| stem.len() > suffix.len() && stem.ends_with(suffix.as_str()))
    })
}

/// Per-run switches.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Center the crop on a detected face.
    pub auto_crop: bool,
    /// Also produce a print sheet.
    pub sheet: bool,
    /// Copies per sheet; `None` uses the standard's sheet spec.
    pub copies: Option<u32>,
    pub quality: Quality,
    /// Gaussian sigma for mask feathering; 0 disables.
    pub feather_sigma: f32,
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            auto_crop: false,
            sheet: false,
            copies: None,
            quality: Quality::new(config.output.quality),
            feather_sigma: config.background.feather_sigma,
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// In-memory result of running the pipeline over one image.
#[derive(Debug, Clone)]
pub struct ProcessedPhoto {
    pub source: Dimensions,
    pub crop: CropRect,
    /// Face the crop was centered on, if one was found.
    pub face: Option<BoundingBox>,
    pub photo: EncodedPhoto,
    pub sheet: Option<EncodedSheet>,
}

/// Files written for one input.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub source: Dimensions,
    pub crop: CropRect,
    pub face: Option<BoundingBox>,
    pub photo_path: PathBuf,
    pub photo: Dimensions,
    pub dpi: u16,
    pub sheet_path: Option<PathBuf>,
    /// Copies placed on the sheet.
    pub sheet_copies: Option<u32>,
}

/// Result for one input of a batch.
#[derive(Debug)]
pub struct FileReport<T> {
    pub input: PathBuf,
    pub result: Result<T, PipelineError>,
}

/// The pipeline for one standard with its models.
pub struct Pipeline<'a> {
    standard: &'a Standard,
    segmenter: &'a dyn Segmenter,
    face_detector: Option<&'a dyn FaceDetector>,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        standard: &'a Standard,
        segmenter: &'a dyn Segmenter,
        face_detector: Option<&'a dyn FaceDetector>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            standard,
            segmenter,
            face_detector,
            options,
        }
    }

    pub fn standard(&self) -> &Standard {
        self.standard
    }

    /// Run every stage on a decoded image. Nothing is written.
    pub fn process_image(&self, image: &RgbImage) -> Result<ProcessedPhoto, PipelineError> {
        let source = Dimensions::of(image);
        validate_dimensions(source, self.standard)?;

        let face = if self.options.auto_crop {
            self.detect_face(image)
        } else {
            None
        };

        let crop = plan_crop(source, self.standard, face.as_ref());
        debug!(?crop, face = face.is_some(), "Crop planned");
        let cropped = apply_crop(image, crop);

        let mask = self
            .segmenter
            .segment(&cropped)?
            .feathered(self.options.feather_sigma);
        let composited = composite_on_white(&cropped, &mask)?;

        let photo = finalize(&composited, self.standard, self.options.quality)?;

        let sheet = if self.options.sheet {
            // Tile the photo exactly as it was encoded
            let finished = image::load_from_memory(&photo.bytes)
                .map_err(ImagingError::from)?
                .to_rgb8();
            Some(compose_sheet(
                &finished,
                self.standard,
                self.options.copies,
                self.options.quality,
            )?)
        } else {
            None
        };

        Ok(ProcessedPhoto {
            source,
            crop,
            face,
            photo,
            sheet,
        })
    }

    /// Best-effort face detection: misses and errors fall back to a centered crop.
    fn detect_face(&self, image: &RgbImage) -> Option<BoundingBox> {
        let Some(detector) = self.face_detector else {
            warn!("Face detection is unavailable; using a centered crop");
            return None;
        };
        match detector.detect(image) {
            Ok(Some(face)) => Some(face),
            Ok(None) => {
                warn!("No face detected; using a centered crop");
                None
            }
            Err(e) => {
                warn!(error = %e, "Face detection failed; using a centered crop");
                None
            }
        }
    }

    /// Decode `input`, run the pipeline, and write the outputs into `output_dir`.
    #[instrument(skip(self, output_dir), fields(standard = %self.standard.code))]
    pub fn process_file(&self, input: &Path, output_dir: &Path) -> Result<FileOutcome, PipelineError> {
        let image = decode(input)?;
        let processed = self.process_image(&image)?;

        let stem = input_stem(input);
        std::fs::create_dir_all(output_dir)?;

        let photo_path = output_dir.join(photo_file_name(&stem, &self.standard.code));
        write_atomic(&photo_path, &processed.photo.bytes)?;

        let sheet_path = match &processed.sheet {
            Some(sheet) => {
                let path = output_dir.join(sheet_file_name(
                    &stem,
                    &self.standard.code,
                    &self.standard.sheet.label,
                ));
                if let Err(e) = write_atomic(&path, &sheet.sheet.bytes) {
                    let _ = std::fs::remove_file(&photo_path);
                    return Err(e.into());
                }
                Some(path)
            }
            None => None,
        };

        info!(photo = %photo_path.display(), "Photo written");
        Ok(FileOutcome {
            source: processed.source,
            crop: processed.crop,
            face: processed.face,
            photo: processed.photo.dimensions,
            dpi: processed.photo.dpi,
            photo_path,
            sheet_copies: processed.sheet.map(|sheet| sheet.copies),
            sheet_path,
        })
    }

    /// Process every input in parallel; reports come back in input order.
    ///
    /// Outputs are named after the input's file stem, so when two inputs share
    /// a stem (`a.png` and `sub/a.png`) only the first is processed and the
    /// later ones fail with [`PipelineError::OutputCollision`].
    pub fn process_batch(
        &self,
        inputs: &[PathBuf],
        output_dir: &Path,
    ) -> Vec<FileReport<FileOutcome>> {
        let owners = earlier_owners(inputs);
        inputs
            .par_iter()
            .zip(owners.par_iter())
            .map(|(input, owner)| FileReport {
                input: input.clone(),
                result: match owner {
                    Some(first) => Err(PipelineError::OutputCollision {
                        output: output_dir
                            .join(photo_file_name(&input_stem(input), &self.standard.code)),
                        first: first.clone(),
                    }),
                    None => self.process_file(input, output_dir),
                },
            })
            .collect()
    }
}

/// For each input, the earlier input whose output names it would reuse.
fn earlier_owners(inputs: &[PathBuf]) -> Vec<Option<PathBuf>> {
    let mut claimed: HashMap<String, &PathBuf> = HashMap::new();
    inputs
        .iter()
        .map(|input| match claimed.entry(input_stem(input)) {
            Entry::Occupied(entry) => Some((*entry.get()).clone()),
            Entry::Vacant(entry) => {
                entry.insert(input);
                None
            }
        })
        .collect()
}

/// Decode an input image to 8-bit RGB.
pub fn decode(path: &Path) -> Result<RgbImage, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::InputNotFound(path.to_path_buf()));
    }
    let image = image::open(path).map_err(|source| PipelineError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgb8())
}

/// Check that `input` can be used for `standard` without processing it.
pub fn check_file(input: &Path, standard: &Standard) -> Result<Dimensions, PipelineError> {
    if !input.exists() {
        return Err(PipelineError::InputNotFound(input.to_path_buf()));
    }
    let (width, height) =
        image::image_dimensions(input).map_err(|source| PipelineError::Decode {
            path: input.to_path_buf(),
            source,
        })?;
    let dimensions = Dimensions::new(width, height);
    validate_dimensions(dimensions, standard)?;
    Ok(dimensions)
}

/// [`check_file`] over a batch, in input order.
pub fn check_batch(inputs: &[PathBuf], standard: &Standard) -> Vec<FileReport<Dimensions>> {
    inputs
        .par_iter()
        .map(|input| FileReport {
            input: input.clone(),
            result: check_file(input, standard),
        })
        .collect()
}

/// Write `bytes` to a temporary file next to `path`, then rename it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::read_jpeg_dpi;
    use crate::models::tests::{FailingSegmenter, MockFaceDetector, MockSegmenter};
    use crate::standards::StandardRegistry;
    use crate::test_helpers::{gradient_image, solid_image, write_png};
    use std::fs;
    use tempfile::TempDir;

    fn standard(code: &str) -> Standard {
        StandardRegistry::stock().get(Some(code)).unwrap().clone()
    }

    fn options(sheet: bool) -> PipelineOptions {
        PipelineOptions {
            sheet,
            ..PipelineOptions::default()
        }
    }

    fn face(x: f64, y: f64) -> BoundingBox {
        BoundingBox {
            x,
            y,
            width: 100.0,
            height: 100.0,
        }
    }

    // =========================================================================
    // process_image
    // =========================================================================

    #[test]
    fn us_end_to_end_in_memory() {
        let us = standard("us");
        let segmenter = MockSegmenter::with_alpha(1.0);
        let pipeline = Pipeline::new(&us, &segmenter, None, options(true));

        let result = pipeline.process_image(&gradient_image(1200, 1200)).unwrap();
        assert_eq!(
            result.crop,
            CropRect {
                x: 0,
                y: 0,
                width: 1200,
                height: 1200
            }
        );
        assert_eq!(result.photo.dimensions, Dimensions::new(600, 600));
        assert_eq!(read_jpeg_dpi(&result.photo.bytes), Some((300, 300)));

        let sheet = result.sheet.unwrap();
        assert_eq!(sheet.copies, 4);
        assert_eq!(sheet.sheet.dimensions, Dimensions::new(1800, 1200));
        let decoded = image::load_from_memory(&sheet.sheet.bytes).unwrap().to_rgb8();
        // 300 px white margins left and right, none top and bottom
        let left = decoded.get_pixel(150, 600).0;
        assert!(left.iter().all(|&c| c > 245), "left margin {left:?}");
        let right = decoded.get_pixel(1650, 600).0;
        assert!(right.iter().all(|&c| c > 245), "right margin {right:?}");
    }

    #[test]
    fn too_small_image_is_rejected_before_models_run() {
        let us = standard("us");
        let segmenter = MockSegmenter::with_alpha(1.0);
        let pipeline = Pipeline::new(&us, &segmenter, None, options(false));

        let err = pipeline.process_image(&gradient_image(500, 500)).unwrap_err();
        assert!(err.is_rejection());
        assert!(segmenter.get_calls().is_empty());
    }

    #[test]
    fn segmenter_sees_cropped_image() {
        let uk = standard("uk");
        let segmenter = MockSegmenter::with_alpha(1.0);
        let pipeline = Pipeline::new(&uk, &segmenter, None, options(false));

        pipeline.process_image(&gradient_image(1200, 1200)).unwrap();
        assert_eq!(segmenter.get_calls(), vec![(934, 1200)]);
    }

    #[test]
    fn transparent_mask_gives_white_photo() {
        let us = standard("us");
        let segmenter = MockSegmenter::with_alpha(0.0);
        let pipeline = Pipeline::new(&us, &segmenter, None, options(false));

        let result = pipeline
            .process_image(&solid_image(800, 800, [20, 40, 60]))
            .unwrap();
        let decoded = image::load_from_memory(&result.photo.bytes).unwrap().to_rgb8();
        assert!(decoded.pixels().all(|p| p.0.iter().all(|&c| c >= 250)));
    }

    #[test]
    fn segmentation_failure_fails_the_file() {
        let us = standard("us");
        let pipeline = Pipeline::new(&us, &FailingSegmenter, None, options(false));
        let err = pipeline.process_image(&gradient_image(600, 600)).unwrap_err();
        assert!(matches!(err, PipelineError::ProcessingFailed(_)));
    }

    #[test]
    fn mask_of_wrong_size_is_a_dimension_mismatch() {
        let us = standard("us");
        let segmenter = MockSegmenter::broken();
        let pipeline = Pipeline::new(&us, &segmenter, None, options(false));
        let err = pipeline.process_image(&gradient_image(600, 600)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Imaging(ImagingError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn auto_crop_centers_on_face() {
        let us = standard("us");
        let segmenter = MockSegmenter::with_alpha(1.0);
        let detector = MockFaceDetector::found(face(1300.0, 250.0));
        let pipeline = Pipeline::new(
            &us,
            &segmenter,
            Some(&detector),
            PipelineOptions {
                auto_crop: true,
                ..PipelineOptions::default()
            },
        );

        let result = pipeline.process_image(&gradient_image(1600, 1000)).unwrap();
        // Face center (1350, 300) pulls the 1000×1000 crop to the right edge
        assert_eq!(
            result.crop,
            CropRect {
                x: 600,
                y: 0,
                width: 1000,
                height: 1000
            }
        );
        assert!(result.face.is_some());
    }

    #[test]
    fn face_detection_failure_falls_back_to_center() {
        let us = standard("us");
        let segmenter = MockSegmenter::with_alpha(1.0);
        let detector = MockFaceDetector::failing();
        let pipeline = Pipeline::new(
            &us,
            &segmenter,
            Some(&detector),
            PipelineOptions {
                auto_crop: true,
                ..PipelineOptions::default()
            },
        );

        let result = pipeline.process_image(&gradient_image(1600, 1000)).unwrap();
        assert_eq!(result.crop.x, 300);
        assert!(result.face.is_none());
        assert_eq!(*detector.calls.lock().unwrap(), 1);
    }

    #[test]
    fn detector_is_not_called_without_auto_crop() {
        let us = standard("us");
        let segmenter = MockSegmenter::with_alpha(1.0);
        let detector = MockFaceDetector::found(face(0.0, 0.0));
        let pipeline = Pipeline::new(&us, &segmenter, Some(&detector), options(false));

        pipeline.process_image(&gradient_image(800, 600)).unwrap();
        assert_eq!(*detector.calls.lock().unwrap(), 0);
    }

    // =========================================================================
    // process_file / batches
    // =========================================================================

    #[test]
    fn process_file_writes_photo_and_sheet() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("portrait.png");
        write_png(&input, &gradient_image(1200, 1200));
        let out = tmp.path().join("out");

        let us = standard("us");
        let segmenter = MockSegmenter::with_alpha(1.0);
        let pipeline = Pipeline::new(&us, &segmenter, None, options(true));
        let outcome = pipeline.process_file(&input, &out).unwrap();

        assert_eq!(outcome.photo_path, out.join("portrait_us_passport.jpg"));
        assert_eq!(
            outcome.sheet_path.as_deref(),
            Some(out.join("portrait_us_passport_4x6.jpg").as_path())
        );
        assert_eq!(outcome.sheet_copies, Some(4));

        let bytes = fs::read(&outcome.photo_path).unwrap();
        assert_eq!(read_jpeg_dpi(&bytes), Some((300, 300)));
        let sheet = image::open(outcome.sheet_path.unwrap()).unwrap();
        assert_eq!((sheet.width(), sheet.height()), (1800, 1200));

        // No temporary files left behind
        assert_eq!(fs::read_dir(&out).unwrap().count(), 2);
    }

    #[test]
    fn rejected_file_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("small.png");
        write_png(&input, &gradient_image(500, 500));
        let out = tmp.path().join("out");

        let us = standard("us");
        let segmenter = MockSegmenter::with_alpha(1.0);
        let pipeline = Pipeline::new(&us, &segmenter, None, options(true));
        let err = pipeline.process_file(&input, &out).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Imaging(ImagingError::RejectedTooSmall { .. })
        ));
        assert!(!out.join("small_us_passport.jpg").exists());
    }

    #[test]
    fn sheet_copies_report_what_fits_on_the_sheet() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("portrait.png");
        write_png(&input, &gradient_image(600, 600));

        let us = standard("us");
        let segmenter = MockSegmenter::with_alpha(1.0);
        let pipeline = Pipeline::new(
            &us,
            &segmenter,
            None,
            PipelineOptions {
                sheet: true,
                copies: Some(10),
                ..PipelineOptions::default()
            },
        );
        let outcome = pipeline.process_file(&input, tmp.path()).unwrap();
        assert_eq!(outcome.sheet_copies, Some(6));
    }

    #[test]
    fn failed_sheet_write_removes_the_photo() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("portrait.png");
        write_png(&input, &gradient_image(600, 600));
        let out = tmp.path().join("out");
        // A directory where the sheet should go makes the rename fail
        fs::create_dir_all(out.join("portrait_us_passport_4x6.jpg")).unwrap();

        let us = standard("us");
        let segmenter = MockSegmenter::with_alpha(1.0);
        let pipeline = Pipeline::new(&us, &segmenter, None, options(true));
        let err = pipeline.process_file(&input, &out).unwrap_err();

        assert!(matches!(err, PipelineError::Io(_)));
        assert!(!out.join("portrait_us_passport.jpg").exists());
        // Only the blocking directory is left
        assert_eq!(fs::read_dir(&out).unwrap().count(), 1);
    }

    #[test]
    fn undecodable_file_is_a_decode_error() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("broken.jpg");
        fs::write(&input, b"not a jpeg").unwrap();

        let us = standard("us");
        let segmenter = MockSegmenter::with_alpha(1.0);
        let pipeline = Pipeline::new(&us, &segmenter, None, options(false));
        assert!(matches!(
            pipeline.process_file(&input, tmp.path()),
            Err(PipelineError::Decode { .. })
        ));
    }

    #[test]
    fn batch_continues_after_failure_and_keeps_order() {
        let tmp = TempDir::new().unwrap();
        let small = tmp.path().join("a_small.png");
        let good = tmp.path().join("b_good.png");
        write_png(&small, &gradient_image(400, 400));
        write_png(&good, &gradient_image(700, 700));
        let out = tmp.path().join("out");

        let india = standard("india");
        let segmenter = MockSegmenter::with_alpha(1.0);
        let pipeline = Pipeline::new(&india, &segmenter, None, options(false));
        let reports = pipeline.process_batch(&[small.clone(), good.clone()], &out);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].input, small);
        assert!(reports[0].result.is_err());
        assert_eq!(reports[1].input, good);
        assert!(out.join("b_good_india_passport.jpg").exists());
    }

    #[test]
    fn batch_refuses_second_input_with_same_output_names() {
        let tmp = TempDir::new().unwrap();
        let photos = tmp.path().join("photos");
        fs::create_dir_all(photos.join("sub")).unwrap();
        write_png(&photos.join("a.png"), &gradient_image(700, 700));
        write_png(&photos.join("sub/a.png"), &gradient_image(700, 700));
        let out = tmp.path().join("out");

        let inputs = discover_inputs(&[photos.clone()], &StandardRegistry::stock());
        let us = standard("us");
        let segmenter = MockSegmenter::with_alpha(1.0);
        let pipeline = Pipeline::new(&us, &segmenter, None, options(false));
        let reports = pipeline.process_batch(&inputs, &out);

        assert_eq!(reports.len(), 2);
        assert_eq!(
            reports[0].result.as_ref().unwrap().photo_path,
            out.join("a_us_passport.jpg")
        );
        match &reports[1].result {
            Err(PipelineError::OutputCollision { output, first }) => {
                assert_eq!(output, &out.join("a_us_passport.jpg"));
                assert_eq!(first, &photos.join("a.png"));
            }
            other => panic!("expected an output collision, got {other:?}"),
        }
        // Only the first input reached the segmenter
        assert_eq!(segmenter.get_calls().len(), 1);
    }

    #[test]
    fn batch_reports_missing_input_and_processes_the_rest() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("good.png");
        write_png(&good, &gradient_image(600, 600));
        let missing = tmp.path().join("missing.png");

        let inputs = discover_inputs(&[good.clone(), missing.clone()], &StandardRegistry::stock());
        assert_eq!(inputs, vec![good, missing]);

        let us = standard("us");
        let segmenter = MockSegmenter::with_alpha(1.0);
        let pipeline = Pipeline::new(&us, &segmenter, None, options(false));
        let reports = pipeline.process_batch(&inputs, tmp.path());

        assert!(reports[0].result.is_ok());
        let err = reports[1].result.as_ref().unwrap_err();
        assert!(matches!(err, PipelineError::InputNotFound(_)));
        assert!(err.is_rejection());
        assert!(tmp.path().join("good_us_passport.jpg").exists());
    }

    #[test]
    fn check_batch_reports_dimensions() {
        let tmp = TempDir::new().unwrap();
        let ok = tmp.path().join("ok.png");
        let small = tmp.path().join("small.png");
        write_png(&ok, &gradient_image(413, 531));
        write_png(&small, &gradient_image(413, 530));

        let reports = check_batch(&[ok, small], &standard("uk"));
        assert_eq!(
            reports[0].result.as_ref().unwrap(),
            &Dimensions::new(413, 531)
        );
        assert!(reports[1].result.as_ref().unwrap_err().is_rejection());
    }

    #[test]
    fn check_missing_file_is_not_found() {
        assert!(matches!(
            check_file(Path::new("/nonexistent/photo.jpg"), &standard("us")),
            Err(PipelineError::InputNotFound(_))
        ));
    }

    // =========================================================================
    // discover_inputs
    // =========================================================================

    #[test]
    fn discover_walks_directories_in_order() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join("b.jpg"), b"").unwrap();
        fs::write(tmp.path().join("a.PNG"), b"").unwrap();
        fs::write(tmp.path().join("notes.txt"), b"").unwrap();
        fs::write(tmp.path().join("a_us_passport.jpg"), b"").unwrap();
        fs::write(tmp.path().join("a_uk_passport_4x6.jpg"), b"").unwrap();
        fs::write(nested.join("c.webp"), b"").unwrap();

        let found = discover_inputs(&[tmp.path().to_path_buf()], &StandardRegistry::stock());
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.jpg", "nested/c.webp"]);
    }

    #[test]
    fn discover_keeps_explicit_files() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("scan.bmp");
        fs::write(&file, b"").unwrap();
        assert_eq!(
            discover_inputs(&[file.clone()], &StandardRegistry::stock()),
            vec![file]
        );
    }

    #[test]
    fn discover_keeps_missing_path_for_per_file_reporting() {
        let missing = PathBuf::from("/nonexistent/dir");
        assert_eq!(
            discover_inputs(&[missing.clone()], &StandardRegistry::stock()),
            vec![missing]
        );
    }

    #[test]
    fn discover_keeps_sources_that_merely_mention_passport() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("john_passport_scan.jpg"), b"").unwrap();
        fs::write(tmp.path().join("passport.png"), b"").unwrap();
        fs::write(tmp.path().join("_us_passport.jpg"), b"").unwrap();
        fs::write(tmp.path().join("john_us_passport.jpg"), b"").unwrap();

        let found = discover_inputs(&[tmp.path().to_path_buf()], &StandardRegistry::stock());
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["_us_passport.jpg", "john_passport_scan.jpg", "passport.png"]);
    }
}

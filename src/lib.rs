//! # Passport Photo
//!
//! Turns ordinary portraits into passport photos that meet a country's
//! standard: the right pixel size, the right aspect ratio, a pure white
//! background, and the DPI a print lab needs. Optionally tiles several copies
//! onto a printable sheet.
//!
//! # Architecture: One Pipeline Per File
//!
//! ```text
//! decode → validate → [detect face] → crop → segment → composite on white
//!        → finalize (Lanczos3 + JPEG @ DPI) → [sheet]
//! ```
//!
//! Every stage is a pure function over in-memory buffers. Only the pipeline
//! touches the filesystem, and only after every output has been encoded, so a
//! rejected or failed file leaves nothing behind.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`standards`] | Passport standards (target size, DPI, minimums, sheet) and their registry |
//! | [`imaging`] | Validate, crop, composite, finalize and sheet stages; pure geometry in `calculations` |
//! | [`models`] | Face detector and segmenter traits with their adapters |
//! | [`pipeline`] | Wires the stages per file, writes outputs atomically, runs batches on rayon |
//! | [`config`] | `passport.toml` loading, merging over stock defaults, validation |
//! | [`naming`] | Output file names |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## No Upscaling
//!
//! A source smaller than the standard's minimum is rejected, never enlarged.
//! Upscaled passport photos are soft and get refused at the counter, so the
//! user is asked for a better source instead.
//!
//! ## Models Behind Traits
//!
//! Face detection and segmentation are the only parts that need trained
//! models. They sit behind [`models::FaceDetector`] and [`models::Segmenter`],
//! so the rest of the crate is tested with mocks and the engine can be swapped
//! in `passport.toml` (an external `rembg` process, an ONNX model, or the
//! SeetaFace cascade) without touching the pipeline.
//!
//! Face detection is best effort: if it fails or finds nothing the crop is
//! centered. Segmentation is mandatory: a photo with its original background
//! is not a passport photo, so a segmentation failure fails the file.
//!
//! ## Soft Edges
//!
//! The segmentation mask is used as continuous alpha and lightly feathered;
//! it is never thresholded. Hair and shoulders blend into the white
//! background instead of showing a hard cut-out line.

pub mod config;
pub mod imaging;
pub mod models;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod standards;

#[cfg(test)]
pub(crate) mod test_helpers;

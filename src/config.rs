//! Application configuration module.
//!
//! Handles loading, validating, and merging `passport.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top of it, so a
//! config file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! `passport.toml` in the current directory is picked up automatically. A
//! different file can be passed with `--config`; in that case the file must
//! exist.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! default_standard = "us"   # Used when --standard is not given
//!
//! [output]
//! quality = 95              # JPEG quality (1-100)
//!
//! [background]
//! feather_sigma = 1.0       # Gaussian blur on the mask edge (0 = off)
//!
//! [segmentation]
//! backend = "command"       # "command" or "onnx"
//! program = "rembg"
//! args = ["i", "{input}", "{output}"]
//! output = "cutout"         # "cutout" (alpha channel) or "mask" (grayscale)
//! input_size = 1024         # onnx only
//! # model = "isnet-general-use.onnx"
//!
//! [face_detection]
//! min_face_size = 150
//! # model = "seeta_fd_frontal_v1.0.bin"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Extra standards are declared as `[[standards]]` tables (see
//! [`StandardDef`]). Unknown keys are rejected to catch typos early.

use crate::standards::{DEFAULT_STANDARD_CODE, StandardDef, StandardError, StandardRegistry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "passport.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error(transparent)]
    Standard(#[from] StandardError),
}

/// Application configuration loaded from `passport.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Standard code used when none is requested on the command line.
    pub default_standard: String,
    pub output: OutputConfig,
    pub background: BackgroundConfig,
    pub segmentation: SegmentationConfig,
    pub face_detection: FaceDetectionConfig,
    pub processing: ProcessingConfig,
    /// Standards added to (or replacing entries of) the stock catalogue.
    pub standards: Vec<StandardDef>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_standard: DEFAULT_STANDARD_CODE.to_string(),
            output: OutputConfig::default(),
            background: BackgroundConfig::default(),
            segmentation: SegmentationConfig::default(),
            face_detection: FaceDetectionConfig::default(),
            processing: ProcessingConfig::default(),
            standards: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.quality == 0 || self.output.quality > 100 {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if !self.background.feather_sigma.is_finite() || self.background.feather_sigma < 0.0 {
            return Err(ConfigError::Validation(
                "background.feather_sigma must be a non-negative number".into(),
            ));
        }
        match self.segmentation.backend {
            SegmentationBackend::Command => {
                if self.segmentation.program.trim().is_empty() {
                    return Err(ConfigError::Validation(
                        "segmentation.program must not be empty".into(),
                    ));
                }
                for placeholder in ["{input}", "{output}"] {
                    if !self.segmentation.args.iter().any(|a| a.contains(placeholder)) {
                        return Err(ConfigError::Validation(format!(
                            "segmentation.args must contain {placeholder}"
                        )));
                    }
                }
            }
            SegmentationBackend::Onnx => {
                if self.segmentation.model.is_none() {
                    return Err(ConfigError::Validation(
                        "segmentation.model is required for the onnx backend".into(),
                    ));
                }
                if self.segmentation.input_size == 0 {
                    return Err(ConfigError::Validation(
                        "segmentation.input_size must be non-zero".into(),
                    ));
                }
            }
        }
        if self.face_detection.min_face_size < 20 {
            return Err(ConfigError::Validation(
                "face_detection.min_face_size must be at least 20".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Build the standard registry: stock catalogue plus `[[standards]]`.
    pub fn registry(&self) -> Result<StandardRegistry, ConfigError> {
        Ok(StandardRegistry::with_definitions(
            &self.standards,
            &self.default_standard,
        )?)
    }
}

/// Encoding settings for photos and sheets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { quality: 95 }
    }
}

/// Background compositing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundConfig {
    /// Gaussian blur sigma applied to the segmentation mask before compositing.
    pub feather_sigma: f32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self { feather_sigma: 1.0 }
    }
}

/// Which segmentation engine produces the foreground mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentationBackend {
    /// An external program such as `rembg`.
    Command,
    /// An ONNX model run in-process (requires the `onnx` feature).
    Onnx,
}

/// What the external segmentation program writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandOutput {
    /// The subject cut out on a transparent background; alpha is the mask.
    Cutout,
    /// A grayscale mask; white is foreground.
    Mask,
}

/// Segmentation model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentationConfig {
    pub backend: SegmentationBackend,
    /// Program run by the command backend.
    pub program: String,
    /// Arguments; `{input}` and `{output}` are replaced with PNG file paths.
    pub args: Vec<String>,
    pub output: CommandOutput,
    /// Model file for the onnx backend.
    pub model: Option<PathBuf>,
    /// Square input resolution expected by the onnx model.
    pub input_size: u32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            backend: SegmentationBackend::Command,
            program: "rembg".to_string(),
            args: vec!["i".to_string(), "{input}".to_string(), "{output}".to_string()],
            output: CommandOutput::Cutout,
            model: None,
            input_size: 1024,
        }
    }
}

/// Face detection settings used by `--auto-crop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaceDetectionConfig {
    /// SeetaFace model file (requires the `rustface` feature).
    pub model: Option<PathBuf>,
    /// Smallest face, in pixels, the detector looks for.
    pub min_face_size: u32,
}

impl Default for FaceDetectionConfig {
    fn default() -> Self {
        Self {
            model: None,
            min_face_size: 150,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of files processed in parallel.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(AppConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the configuration.
///
/// An `explicit` path must exist. Without one, `passport.toml` in `dir` is
/// used when present and the stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<AppConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(
            load_raw_config(path)?.ok_or_else(|| ConfigError::NotFound(path.to_path_buf()))?,
        ),
        None => load_raw_config(&dir.join(CONFIG_FILE_NAME))?,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `passport.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Passport Photo Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# Standard used when --standard is not given.
default_standard = "us"

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# JPEG quality for photos and sheets (1 = worst, 100 = best).
quality = 95

# ---------------------------------------------------------------------------
# Background compositing
# ---------------------------------------------------------------------------
[background]
# Gaussian blur applied to the foreground mask before compositing on white.
# Softens the cut-out edge; 0 disables.
feather_sigma = 1.0

# ---------------------------------------------------------------------------
# Segmentation (background removal)
# ---------------------------------------------------------------------------
[segmentation]
# "command" runs an external program; "onnx" runs a model in-process
# (only available when built with the `onnx` feature).
backend = "command"

# Command backend: {input} and {output} are replaced with PNG paths.
program = "rembg"
args = ["i", "{input}", "{output}"]
# "cutout" reads the alpha channel of the output, "mask" reads its gray level.
output = "cutout"

# ONNX backend: ISNet / U2-Net style model and its square input size.
# model = "isnet-general-use.onnx"
input_size = 1024

# ---------------------------------------------------------------------------
# Face detection (--auto-crop)
# ---------------------------------------------------------------------------
[face_detection]
# SeetaFace frontal model (only used when built with the `rustface` feature).
# model = "seeta_fd_frontal_v1.0.bin"
# Smallest face to look for, in pixels.
min_face_size = 150

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum files processed in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Extra standards
# ---------------------------------------------------------------------------
# Add a standard, or replace a stock one by reusing its code.
# Minimum sizes default to the target size; the sheet defaults to 6x4 in.
#
# [[standards]]
# code = "schengen"
# display_name = "Schengen visa"
# description = "35x45 mm photo for Schengen visa applications."
# width_px = 413
# height_px = 531
# dpi = 300
#
# [standards.sheet]
# width_px = 1800
# height_px = 1200
# copies = 4
# label = "4x6"
"##
}

//! Segmentation through an external program.
//!
//! The image is written to a temporary PNG, the program is run with
//! `{input}` and `{output}` substituted into its arguments, and the PNG it
//! writes is read back as a mask:
//!
//! | `output` mode | Mask source |
//! |---|---|
//! | `cutout` | alpha channel (images without alpha count as fully opaque) |
//! | `mask` | gray level, white = foreground |
//!
//! The default configuration runs `rembg i {input} {output}`.

use super::{ModelError, Segmenter};
use crate::config::{CommandOutput, SegmentationConfig};
use crate::imaging::Mask;
use image::{ImageFormat, RgbImage};
use std::path::Path;
use std::process::Command;
use tracing::debug;

pub struct CommandSegmenter {
    program: String,
    args: Vec<String>,
    output: CommandOutput,
}

impl CommandSegmenter {
    pub fn new(program: impl Into<String>, args: Vec<String>, output: CommandOutput) -> Self {
        Self {
            program: program.into(),
            args,
            output,
        }
    }

    pub fn from_config(config: &SegmentationConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone(), config.output)
    }

    fn command_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }
}

impl Segmenter for CommandSegmenter {
    fn segment(&self, image: &RgbImage) -> Result<Mask, ModelError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("input.png");
        let output = workdir.path().join("output.png");

        image
            .save_with_format(&input, ImageFormat::Png)
            .map_err(|e| ModelError::ProcessingFailed(format!("writing model input: {e}")))?;

        let args = self.command_args(&input, &output);
        debug!(program = %self.program, ?args, "Running segmentation command");

        let result = Command::new(&self.program).args(&args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ModelError::Unavailable(format!("segmentation program '{}' not found", self.program))
            } else {
                ModelError::Io(e)
            }
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ModelError::ProcessingFailed(format!(
                "'{}' exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }

        let decoded = image::open(&output).map_err(|e| {
            ModelError::ProcessingFailed(format!(
                "reading output of '{}': {e}",
                self.program
            ))
        })?;

        Ok(match self.output {
            CommandOutput::Cutout => Mask::from_rgba_alpha(&decoded.to_rgba8()),
            CommandOutput::Mask => Mask::from_luma8(&decoded.to_luma8()),
        })
    }
}

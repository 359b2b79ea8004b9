//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Each input leads with its positional index and file name; paths, sizes and
//! errors follow as indented context lines. The same header is used by
//! `process` and `check` so the two outputs line up for the same inputs.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! 001 portrait.png
//!     Source: photos/portrait.png (1200×1200)
//!     Crop: 1200×1200 at (0, 0), centered
//!     Photo: out/portrait_us_passport.jpg (600×600 @ 300 DPI)
//!     Sheet: out/portrait_us_passport_4x6.jpg (4 copies)
//! 002 small.png
//!     Source: photos/small.png
//!     Rejected: Image is 500×500 but the 'us' standard needs at least 600×600. ...
//!
//! Processed 1 of 2 photos for United States (USCIS) (1 failed)
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 portrait.png: ok 1200×1200
//! 002 small.png: rejected
//!     Image is 500×500 but the 'us' standard needs at least 600×600. ...
//! ```
//!
//! ## Standards
//!
//! ```text
//! india  India                  2.00×2.00 in (600×600 px) @ 300 DPI
//!     51×51 mm (2×2 in) photo for Indian passport services.
//! uk     United Kingdom         1.38×1.77 in (413×531 px) @ 300 DPI
//!     35×45 mm photo for UK passport applications.
//! us     United States (USCIS)  2.00×2.00 in (600×600 px) @ 300 DPI (default)
//!     2×2 in photo for US passports and visas.
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::imaging::Dimensions;
use crate::pipeline::{FileOutcome, FileReport, PipelineError};
use crate::standards::{Standard, StandardRegistry};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Header line for one input: index + file name.
fn input_header(index: usize, input: &Path) -> String {
    let name = input
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    format!("{} {}", format_index(index), name)
}

/// Label for a failed file: user-input problems read as rejections.
fn failure_label(error: &PipelineError) -> &'static str {
    if error.is_rejection() {
        "Rejected"
    } else {
        "Error"
    }
}

fn count_noun(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

// ============================================================================
// process
// ============================================================================

/// Format the result of processing one input.
pub fn format_process_report(index: usize, report: &FileReport<FileOutcome>) -> Vec<String> {
    let mut lines = vec![input_header(index, &report.input)];
    match &report.result {
        Ok(outcome) => {
            lines.push(format!(
                "{}Source: {} ({})",
                indent(1),
                report.input.display(),
                outcome.source
            ));
            let anchor = if outcome.face.is_some() {
                "face"
            } else {
                "centered"
            };
            lines.push(format!(
                "{}Crop: {} at ({}, {}), {}",
                indent(1),
                Dimensions::new(outcome.crop.width, outcome.crop.height),
                outcome.crop.x,
                outcome.crop.y,
                anchor
            ));
            lines.push(format!(
                "{}Photo: {} ({} @ {} DPI)",
                indent(1),
                outcome.photo_path.display(),
                outcome.photo,
                outcome.dpi
            ));
            if let Some(sheet) = &outcome.sheet_path {
                let copies = outcome.sheet_copies.unwrap_or_default() as usize;
                lines.push(format!(
                    "{}Sheet: {} ({})",
                    indent(1),
                    sheet.display(),
                    count_noun(copies, "copy", "copies")
                ));
            }
        }
        Err(e) => {
            lines.push(format!("{}Source: {}", indent(1), report.input.display()));
            lines.push(format!("{}{}: {}", indent(1), failure_label(e), e));
        }
    }
    lines
}

/// Format every report of a `process` run followed by a summary line.
pub fn format_process_output(
    reports: &[FileReport<FileOutcome>],
    standard: &Standard,
) -> Vec<String> {
    let mut lines: Vec<String> = reports
        .iter()
        .enumerate()
        .flat_map(|(i, report)| format_process_report(i + 1, report))
        .collect();
    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    lines.push(String::new());
    lines.push(format_summary(
        "Processed",
        reports.len(),
        failed,
        standard,
    ));
    lines
}

/// `Processed 3 of 4 photos for United States (USCIS) (1 failed)`
pub fn format_summary(verb: &str, total: usize, failed: usize, standard: &Standard) -> String {
    let done = total - failed;
    let mut line = format!(
        "{} {} of {} for {}",
        verb,
        done,
        count_noun(total, "photo", "photos"),
        standard.display_name
    );
    if failed > 0 {
        line.push_str(&format!(" ({} failed)", failed));
    }
    line
}

pub fn print_process_output(reports: &[FileReport<FileOutcome>], standard: &Standard) {
    for line in format_process_output(reports, standard) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

/// Format the result of checking one input.
pub fn format_check_report(index: usize, report: &FileReport<Dimensions>) -> Vec<String> {
    let header = input_header(index, &report.input);
    match &report.result {
        Ok(dimensions) => vec![format!("{}: ok {}", header, dimensions)],
        Err(e) => vec![
            format!("{}: {}", header, failure_label(e).to_lowercase()),
            format!("{}{}", indent(1), e),
        ],
    }
}

pub fn format_check_output(reports: &[FileReport<Dimensions>], standard: &Standard) -> Vec<String> {
    let mut lines: Vec<String> = reports
        .iter()
        .enumerate()
        .flat_map(|(i, report)| format_check_report(i + 1, report))
        .collect();
    let failed = reports.iter().filter(|r| r.result.is_err()).count();
    lines.push(String::new());
    lines.push(format_summary("Accepted", reports.len(), failed, standard));
    lines
}

pub fn print_check_output(reports: &[FileReport<Dimensions>], standard: &Standard) {
    for line in format_check_output(reports, standard) {
        println!("{}", line);
    }
}

// ============================================================================
// standards
// ============================================================================

/// Format the registry as an aligned table, one standard per entry.
pub fn format_standards(registry: &StandardRegistry) -> Vec<String> {
    let code_width = registry.iter().map(|s| s.code.len()).max().unwrap_or(0);
    let name_width = registry
        .iter()
        .map(|s| s.display_name.chars().count())
        .max()
        .unwrap_or(0);
    let default_code = &registry.default_standard().code;

    let mut lines = Vec::new();
    for standard in registry.iter() {
        let mut line = format!(
            "{:<cw$}  {:<nw$}  {} @ {} DPI",
            standard.code,
            standard.display_name,
            standard.formatted_dimensions(),
            standard.dpi,
            cw = code_width,
            nw = name_width,
        );
        if &standard.code == default_code {
            line.push_str(" (default)");
        }
        lines.push(line);
        if !standard.description.is_empty() {
            lines.push(format!("{}{}", indent(1), standard.description));
        }
    }
    lines
}

pub fn print_standards(registry: &StandardRegistry) {
    for line in format_standards(registry) {
        println!("{}", line);
    }
}

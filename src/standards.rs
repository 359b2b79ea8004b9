//! Passport photo standards and the registry that holds them.
//!
//! A [`Standard`] pins down everything the pipeline needs to know about a
//! country's photo format: the exact output pixel size, the DPI written into
//! the file, the smallest source image that can be used without upscaling, and
//! how copies are tiled onto a printable sheet.
//!
//! ## Stock catalogue
//!
//! | Code | Output | Physical size | Sheet |
//! |------|--------|---------------|-------|
//! | `us` | 600×600 px @ 300 DPI | 2×2 in | 1800×1200 px (6×4 in), 4 copies |
//! | `india` | 600×600 px @ 300 DPI | 51×51 mm | 1800×1200 px (6×4 in), 4 copies |
//! | `uk` | 413×531 px @ 300 DPI | 35×45 mm | 1800×1200 px (6×4 in), 4 copies |
//!
//! Additional standards can be declared in `passport.toml` (see
//! [`config`](crate::config)); they are validated with the same rules as the
//! stock entries and may replace a stock entry by reusing its code.
//!
//! The registry is built once at startup and passed explicitly to whatever
//! needs it. Nothing reads it from global state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Code of the standard used when none is requested.
pub const DEFAULT_STANDARD_CODE: &str = "us";

#[derive(Error, Debug, PartialEq)]
pub enum StandardError {
    #[error("Unknown passport standard '{code}'. Available: {available}")]
    Unknown { code: String, available: String },
    #[error("Invalid standard '{code}': {reason}")]
    Invalid { code: String, reason: String },
}

/// How finished photos are tiled onto a printable sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetSpec {
    pub width_px: u32,
    pub height_px: u32,
    /// Number of copies placed on one sheet.
    pub copies: u32,
    /// Short label used in sheet file names, e.g. `4x6`.
    pub label: String,
}

impl SheetSpec {
    /// A 6×4 in landscape sheet at 300 DPI holding four copies.
    pub fn four_by_six() -> Self {
        Self {
            width_px: 1800,
            height_px: 1200,
            copies: 4,
            label: "4x6".to_string(),
        }
    }
}

/// An immutable passport photo specification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standard {
    pub code: String,
    pub display_name: String,
    pub description: String,
    pub width_px: u32,
    pub height_px: u32,
    pub dpi: u32,
    pub min_width_px: u32,
    pub min_height_px: u32,
    pub sheet: SheetSpec,
}

impl Standard {
    /// Target `(width, height)` in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width_px, self.height_px)
    }

    /// Width divided by height of the finished photo.
    pub fn aspect_ratio(&self) -> f64 {
        self.width_px as f64 / self.height_px as f64
    }

    /// Physical size at the standard's DPI, e.g. `2.00×2.00 in (600×600 px)`.
    pub fn formatted_dimensions(&self) -> String {
        let width_in = self.width_px as f64 / self.dpi as f64;
        let height_in = self.height_px as f64 / self.dpi as f64;
        format!(
            "{:.2}\u{d7}{:.2} in ({}\u{d7}{} px)",
            width_in, height_in, self.width_px, self.height_px
        )
    }

    /// Check the record invariants: non-zero sizes, minimums within the target.
    pub fn validate(&self) -> Result<(), StandardError> {
        let invalid = |reason: &str| StandardError::Invalid {
            code: self.code.clone(),
            reason: reason.to_string(),
        };
        if self.code.is_empty() {
            return Err(invalid("code must not be empty"));
        }
        if self.width_px == 0 || self.height_px == 0 {
            return Err(invalid("target dimensions must be non-zero"));
        }
        if self.dpi == 0 || self.dpi > u16::MAX as u32 {
            return Err(invalid("dpi must be between 1 and 65535"));
        }
        if self.min_width_px == 0 || self.min_height_px == 0 {
            return Err(invalid("minimum dimensions must be non-zero"));
        }
        if self.min_width_px > self.width_px || self.min_height_px > self.height_px {
            return Err(invalid("minimum dimensions must not exceed target dimensions"));
        }
        if self.sheet.width_px == 0 || self.sheet.height_px == 0 {
            return Err(invalid("sheet dimensions must be non-zero"));
        }
        if self.sheet.copies == 0 {
            return Err(invalid("sheet copies must be at least 1"));
        }
        if self.sheet.label.is_empty() {
            return Err(invalid("sheet label must not be empty"));
        }
        Ok(())
    }
}

/// A standard as written in `passport.toml`.
///
/// Minimum dimensions default to the target dimensions and the sheet defaults
/// to [`SheetSpec::four_by_six`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StandardDef {
    pub code: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub width_px: u32,
    pub height_px: u32,
    pub dpi: u32,
    #[serde(default)]
    pub min_width_px: Option<u32>,
    #[serde(default)]
    pub min_height_px: Option<u32>,
    #[serde(default)]
    pub sheet: Option<SheetSpec>,
}

impl StandardDef {
    pub fn into_standard(self) -> Standard {
        let code = self.code.to_lowercase();
        Standard {
            display_name: self.display_name.unwrap_or_else(|| code.to_uppercase()),
            description: self.description.unwrap_or_default(),
            min_width_px: self.min_width_px.unwrap_or(self.width_px),
            min_height_px: self.min_height_px.unwrap_or(self.height_px),
            sheet: self.sheet.unwrap_or_else(SheetSpec::four_by_six),
            width_px: self.width_px,
            height_px: self.height_px,
            dpi: self.dpi,
            code,
        }
    }
}

/// The built-in standards.
pub fn stock_standards() -> Vec<Standard> {
    vec![
        Standard {
            code: "us".to_string(),
            display_name: "United States (USCIS)".to_string(),
            description: "2\u{d7}2 in photo for US passports and visas.".to_string(),
            width_px: 600,
            height_px: 600,
            dpi: 300,
            min_width_px: 600,
            min_height_px: 600,
            sheet: SheetSpec::four_by_six(),
        },
        Standard {
            code: "india".to_string(),
            display_name: "India".to_string(),
            description: "51\u{d7}51 mm (2\u{d7}2 in) photo for Indian passport services."
                .to_string(),
            width_px: 600,
            height_px: 600,
            dpi: 300,
            min_width_px: 600,
            min_height_px: 600,
            sheet: SheetSpec::four_by_six(),
        },
        Standard {
            code: "uk".to_string(),
            display_name: "United Kingdom".to_string(),
            description: "35\u{d7}45 mm photo for UK passport applications.".to_string(),
            width_px: 413,
            height_px: 531,
            dpi: 300,
            min_width_px: 413,
            min_height_px: 531,
            sheet: SheetSpec::four_by_six(),
        },
    ]
}

/// Lookup table of standards keyed by lowercase code.
#[derive(Debug, Clone)]
pub struct StandardRegistry {
    standards: BTreeMap<String, Standard>,
    default_code: String,
}

impl StandardRegistry {
    /// Build a registry from a list of standards, validating each one.
    ///
    /// Later entries replace earlier ones with the same code. The default code
    /// must name one of the entries.
    pub fn new(
        standards: impl IntoIterator<Item = Standard>,
        default_code: &str,
    ) -> Result<Self, StandardError> {
        let mut map = BTreeMap::new();
        for standard in standards {
            standard.validate()?;
            map.insert(standard.code.to_lowercase(), standard);
        }
        let registry = Self {
            standards: map,
            default_code: default_code.to_lowercase(),
        };
        if !registry.standards.contains_key(&registry.default_code) {
            return Err(registry.unknown(default_code));
        }
        Ok(registry)
    }

    /// The stock catalogue with `us` as default.
    pub fn stock() -> Self {
        let standards = stock_standards()
            .into_iter()
            .map(|s| (s.code.clone(), s))
            .collect();
        Self {
            standards,
            default_code: DEFAULT_STANDARD_CODE.to_string(),
        }
    }

    /// Stock catalogue extended (or overridden) by user definitions.
    pub fn with_definitions(
        definitions: &[StandardDef],
        default_code: &str,
    ) -> Result<Self, StandardError> {
        let all = stock_standards()
            .into_iter()
            .chain(definitions.iter().cloned().map(StandardDef::into_standard));
        Self::new(all, default_code)
    }

    /// Resolve a standard by code, case-insensitively. `None` selects the default.
    pub fn get(&self, code: Option<&str>) -> Result<&Standard, StandardError> {
        let key = match code {
            Some(c) if !c.trim().is_empty() => c.trim().to_lowercase(),
            _ => self.default_code.clone(),
        };
        self.standards.get(&key).ok_or_else(|| self.unknown(&key))
    }

    pub fn default_standard(&self) -> &Standard {
        &self.standards[&self.default_code]
    }

    /// All standards sorted by code.
    pub fn iter(&self) -> impl Iterator<Item = &Standard> {
        self.standards.values()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.standards.keys().map(String::as_str).collect()
    }

    fn unknown(&self, code: &str) -> StandardError {
        StandardError::Unknown {
            code: code.to_string(),
            available: self.codes().join(", "),
        }
    }
}

impl Default for StandardRegistry {
    fn default() -> Self {
        Self::stock()
    }
}

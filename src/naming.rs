//! Output file naming.
//!
//! Every output is named after the input's file stem and the standard it was
//! produced for, so running several standards over the same portrait never
//! overwrites earlier results:
//!
//! - `portrait.png` + `us` → `portrait_us_passport.jpg`
//! - its sheet → `portrait_us_passport_4x6.jpg`

use std::path::Path;

/// File name of a finished photo.
pub fn photo_file_name(stem: &str, code: &str) -> String {
    format!("{stem}_{code}_passport.jpg")
}

/// File name of a print sheet.
pub fn sheet_file_name(stem: &str, code: &str, label: &str) -> String {
    format!("{stem}_{code}_passport_{label}.jpg")
}

/// File stem of `path`, or `"photo"` when it has none.
pub fn input_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "photo".to_string())
}

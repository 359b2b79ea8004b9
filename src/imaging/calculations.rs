//! Pure geometry for the pipeline: crop rectangles and sheet grids.
//!
//! All functions here are pure and testable without any I/O or images.

use super::error::ImagingError;
use super::params::{BoundingBox, CropRect, Dimensions};

/// Float noise allowed before a fractional size is rounded up to the next pixel.
const ROUNDING_SLACK: f64 = 1e-6;

/// Calculate the crop rectangle for a target aspect ratio.
///
/// The rectangle is the largest one with `aspect_ratio` (width / height) that
/// fits the source: `width = min(W, H * aspect)`, `height = width / aspect`.
/// It is centered on the image, or on the center of `face` when one is given.
/// A face-centered rectangle that would hang over an edge is shifted back
/// inside, never shrunk.
///
/// Rounding: the top-left corner is rounded down and the size rounded up, then
/// everything is clamped so the rectangle never leaves the source bounds.
///
/// # Examples
/// ```
/// # use passport_photo::imaging::{Dimensions, calculate_crop_rect};
/// // Landscape source, square target → centered square
/// let rect = calculate_crop_rect(Dimensions::new(1600, 1200), 1.0, None);
/// assert_eq!((rect.x, rect.y, rect.width, rect.height), (200, 0, 1200, 1200));
/// ```
pub fn calculate_crop_rect(
    source: Dimensions,
    aspect_ratio: f64,
    face: Option<&BoundingBox>,
) -> CropRect {
    let src_w = source.width as f64;
    let src_h = source.height as f64;

    let crop_w = src_w.min(src_h * aspect_ratio);
    let crop_h = crop_w / aspect_ratio;

    let (center_x, center_y) = match face {
        Some(face) => face.center(),
        None => (src_w / 2.0, src_h / 2.0),
    };

    // Shift into bounds; the size is fixed at this point
    let left = (center_x - crop_w / 2.0).clamp(0.0, (src_w - crop_w).max(0.0));
    let top = (center_y - crop_h / 2.0).clamp(0.0, (src_h - crop_h).max(0.0));

    let width = round_up(crop_w).min(source.width);
    let height = round_up(crop_h).min(source.height);

    CropRect {
        x: (left.floor() as u32).min(source.width - width),
        y: (top.floor() as u32).min(source.height - height),
        width,
        height,
    }
}

fn round_up(value: f64) -> u32 {
    (value - ROUNDING_SLACK).ceil().max(1.0) as u32
}

/// Placement of photos on a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    /// Columns of the used grid.
    pub columns: u32,
    /// Rows of the used grid.
    pub rows: u32,
    pub margin_left: u32,
    pub margin_top: u32,
    /// Top-left corner of every placed copy, row-major.
    pub positions: Vec<(u32, u32)>,
}

impl SheetLayout {
    pub fn placed(&self) -> usize {
        self.positions.len()
    }

    /// Cells of the used grid left blank.
    pub fn empty_cells(&self) -> usize {
        (self.columns * self.rows) as usize - self.positions.len()
    }
}

/// Calculate how `copies` photos are tiled onto a sheet.
///
/// The sheet holds at most `floor(sheet_w / photo_w)` columns by
/// `floor(sheet_h / photo_h)` rows. Out of the grids inside that capacity with
/// enough cells for the copies, the one with the fewest cells is used; ties go
/// to the grid whose horizontal and vertical leftover space is most nearly
/// equal. When the sheet cannot hold every copy, the whole capacity is used.
///
/// The used grid is centered. Leftover space is split in half with the odd
/// pixel going to the bottom/right margin. Copies are placed row-major.
///
/// # Errors
/// [`ImagingError::Layout`] when not even one photo fits on the sheet.
pub fn calculate_sheet_layout(
    photo: Dimensions,
    sheet: Dimensions,
    copies: u32,
) -> Result<SheetLayout, ImagingError> {
    let max_columns = sheet.width.checked_div(photo.width).unwrap_or(0);
    let max_rows = sheet.height.checked_div(photo.height).unwrap_or(0);
    if max_columns == 0 || max_rows == 0 {
        return Err(ImagingError::Layout { photo, sheet });
    }

    let placed = copies.min(max_columns * max_rows);
    let wanted = placed.max(1);

    let leftover = |columns: u32, rows: u32| {
        (
            sheet.width - columns * photo.width,
            sheet.height - rows * photo.height,
        )
    };

    // For a given row count, extra columns only add empty cells, so the
    // narrowest grid per row count is the only candidate worth comparing.
    let (columns, rows) = (1..=max_rows)
        .filter_map(|rows| {
            let columns = wanted.div_ceil(rows);
            (columns <= max_columns).then_some((columns, rows))
        })
        .min_by_key(|&(columns, rows)| {
            let (left_x, left_y) = leftover(columns, rows);
            (columns * rows, left_x.abs_diff(left_y))
        })
        .unwrap_or((max_columns, max_rows));

    let (left_x, left_y) = leftover(columns, rows);
    let margin_left = left_x / 2;
    let margin_top = left_y / 2;

    let positions = (0..placed)
        .map(|i| {
            let column = i % columns;
            let row = i / columns;
            (
                margin_left + column * photo.width,
                margin_top + row * photo.height,
            )
        })
        .collect();

    Ok(SheetLayout {
        columns,
        rows,
        margin_left,
        margin_top,
        positions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-2;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions::new(width, height)
    }

    fn face(x: f64, y: f64, width: f64, height: f64) -> BoundingBox {
        BoundingBox {
            x,
            y,
            width,
            height,
        }
    }

    // =========================================================================
    // calculate_crop_rect tests
    // =========================================================================

    #[test]
    fn square_source_square_target_is_full_image() {
        let rect = calculate_crop_rect(dims(1200, 1200), 1.0, None);
        assert_eq!(
            rect,
            CropRect {
                x: 0,
                y: 0,
                width: 1200,
                height: 1200
            }
        );
    }

    #[test]
    fn wide_source_is_constrained_by_height() {
        let rect = calculate_crop_rect(dims(1600, 1200), 1.0, None);
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (200, 0, 1200, 1200));
    }

    #[test]
    fn tall_source_is_constrained_by_width() {
        let rect = calculate_crop_rect(dims(1000, 1800), 1.0, None);
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (0, 400, 1000, 1000));
    }

    #[test]
    fn portrait_ratio_on_square_source() {
        // 35x45 mm at 300 DPI
        let aspect = 413.0 / 531.0;
        let rect = calculate_crop_rect(dims(1200, 1200), aspect, None);
        assert_eq!(rect.height, 1200);
        assert_eq!(rect.width, 934); // 933.33 rounded up
        assert_eq!(rect.x, 133); // 133.33 rounded down
        assert_eq!(rect.y, 0);
        assert!((rect.aspect_ratio() - aspect).abs() < EPSILON);
    }

    #[test]
    fn exact_minimum_source_is_not_padded() {
        let rect = calculate_crop_rect(dims(413, 531), 413.0 / 531.0, None);
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (0, 0, 413, 531));
    }

    #[test]
    fn face_box_moves_center() {
        // 2000x1200 source, square crop of 1200; face centered at x=700
        let rect = calculate_crop_rect(dims(2000, 1200), 1.0, Some(&face(600.0, 400.0, 200.0, 200.0)));
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (100, 0, 1200, 1200));
    }

    #[test]
    fn face_near_left_edge_is_clamped_by_shifting() {
        let rect = calculate_crop_rect(dims(2000, 1000), 1.0, Some(&face(0.0, 100.0, 100.0, 100.0)));
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (0, 0, 1000, 1000));
    }

    #[test]
    fn face_near_right_edge_is_clamped_by_shifting() {
        let rect = calculate_crop_rect(dims(2000, 1000), 1.0, Some(&face(1900.0, 800.0, 100.0, 100.0)));
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (1000, 0, 1000, 1000));
    }

    #[test]
    fn face_box_vertical_shift_on_tall_source() {
        let rect = calculate_crop_rect(dims(1000, 3000), 1.0, Some(&face(400.0, 500.0, 200.0, 200.0)));
        // face center y = 600 → top = 100
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (0, 100, 1000, 1000));
    }

    #[test]
    fn face_box_outside_image_still_yields_valid_rect() {
        let source = dims(900, 1500);
        let rect = calculate_crop_rect(source, 1.0, Some(&face(-500.0, 5000.0, 10.0, 10.0)));
        assert!(rect.fits_within(source));
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (0, 600, 900, 900));
    }

    #[test]
    fn crop_rect_always_within_bounds_and_on_ratio() {
        let aspects = [1.0, 413.0 / 531.0, 35.0 / 45.0, 3.0 / 4.0, 4.0 / 3.0];
        let sources = [
            (600, 600),
            (601, 599),
            (1201, 1799),
            (4032, 3024),
            (3024, 4032),
            (777, 1333),
        ];
        let faces = [
            None,
            Some(face(0.0, 0.0, 50.0, 50.0)),
            Some(face(300.0, 250.0, 120.0, 160.0)),
            Some(face(5000.0, 5000.0, 10.0, 10.0)),
        ];
        for &aspect in &aspects {
            for &(w, h) in &sources {
                for f in &faces {
                    let source = dims(w, h);
                    let rect = calculate_crop_rect(source, aspect, f.as_ref());
                    assert!(rect.fits_within(source), "{rect:?} outside {w}x{h}");
                    assert!(
                        (rect.aspect_ratio() - aspect).abs() < EPSILON,
                        "{rect:?} ratio {} != {aspect}",
                        rect.aspect_ratio()
                    );
                }
            }
        }
    }

    // =========================================================================
    // calculate_sheet_layout tests
    // =========================================================================

    #[test]
    fn sheet_exactly_two_by_two() {
        let layout = calculate_sheet_layout(dims(600, 600), dims(1200, 1200), 4).unwrap();
        assert_eq!((layout.columns, layout.rows), (2, 2));
        assert_eq!((layout.margin_left, layout.margin_top), (0, 0));
        assert_eq!(
            layout.positions,
            vec![(0, 0), (600, 0), (0, 600), (600, 600)]
        );
        assert_eq!(layout.empty_cells(), 0);
    }

    #[test]
    fn us_sheet_is_centered_two_by_two() {
        let layout = calculate_sheet_layout(dims(600, 600), dims(1800, 1200), 4).unwrap();
        assert_eq!((layout.columns, layout.rows), (2, 2));
        assert_eq!((layout.margin_left, layout.margin_top), (300, 0));
        assert_eq!(
            layout.positions,
            vec![(300, 0), (900, 0), (300, 600), (900, 600)]
        );
    }

    #[test]
    fn uk_sheet_prefers_balanced_margins() {
        // Both 1x4 and 2x2 hold four copies; 1x4 leaves 148/669 px, 2x2 974/138 px
        let layout = calculate_sheet_layout(dims(413, 531), dims(1800, 1200), 4).unwrap();
        assert_eq!((layout.columns, layout.rows), (4, 1));
        assert_eq!(layout.margin_left, 74);
        assert_eq!(layout.margin_top, 334); // 669 / 2, odd pixel to the bottom
        assert_eq!(layout.positions[3], (74 + 3 * 413, 334));
    }

    #[test]
    fn partial_row_leaves_blank_cells() {
        let layout = calculate_sheet_layout(dims(600, 600), dims(1800, 1200), 5).unwrap();
        assert_eq!((layout.columns, layout.rows), (3, 2));
        assert_eq!(layout.placed(), 5);
        assert_eq!(layout.empty_cells(), 1);
        assert_eq!(layout.positions[4], (600, 600));
    }

    #[test]
    fn copies_beyond_capacity_fill_the_sheet() {
        let layout = calculate_sheet_layout(dims(600, 600), dims(1800, 1200), 10).unwrap();
        assert_eq!((layout.columns, layout.rows), (3, 2));
        assert_eq!(layout.placed(), 6);
    }

    #[test]
    fn single_copy_is_centered() {
        let layout = calculate_sheet_layout(dims(600, 600), dims(1801, 1201), 1).unwrap();
        assert_eq!((layout.columns, layout.rows), (1, 1));
        assert_eq!(layout.positions, vec![(600, 300)]);
    }

    #[test]
    fn photo_larger_than_sheet_is_layout_error() {
        let err = calculate_sheet_layout(dims(600, 600), dims(1800, 500), 4).unwrap_err();
        assert!(matches!(err, ImagingError::Layout { .. }));
    }

    #[test]
    fn zero_sized_photo_is_layout_error() {
        assert!(calculate_sheet_layout(dims(0, 600), dims(1800, 1200), 4).is_err());
    }
}

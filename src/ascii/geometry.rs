//! Character grid geometry for aspect-ratio-correct ASCII rendering.

use std::fmt;

use crate::frame::Rational;

/// Maximum output width in characters.
pub const MAX_COLUMNS: u32 = 80;

/// Terminal character cell aspect ratio (width / height).
/// Glyphs are typically ~2x taller than wide.
pub const CHAR_CELL_ASPECT: f64 = 0.5;

/// Resolved size of the character grid.
///
/// Both dimensions are even and at least 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub columns: u32,
    pub rows: u32,
}

impl fmt::Display for GridGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}

/// Display aspect ratio of a source picture after SAR correction.
pub fn display_aspect(src_width: u32, src_height: u32, sar: Rational) -> f64 {
    let corrected_width = src_width as f64 * sar.to_f64_or_one();
    corrected_width / src_height as f64
}

/// Calculate the character grid for a source picture.
///
/// Columns always saturate to `max_columns`; narrow sources are not shrunk.
/// Rows follow from the display aspect ratio compensated by `cell_aspect`,
/// so a square source at the default cell aspect gets half as many rows as
/// columns. Rows have no upper bound: very tall sources produce very tall
/// grids.
///
/// Both dimensions are rounded to the nearest even integer and clamped to
/// at least 2.
///
/// # Example
/// ```
/// use glyphframe::ascii::{resolve, CHAR_CELL_ASPECT, MAX_COLUMNS};
/// use glyphframe::frame::Rational;
///
/// let grid = resolve(720, 720, Rational::ONE, MAX_COLUMNS, CHAR_CELL_ASPECT);
/// assert_eq!((grid.columns, grid.rows), (80, 40));
/// ```
pub fn resolve(
    src_width: u32,
    src_height: u32,
    sar: Rational,
    max_columns: u32,
    cell_aspect: f64,
) -> GridGeometry {
    let dar = display_aspect(src_width, src_height, sar);
    let adjusted_aspect = dar / cell_aspect;

    let target_columns = max_columns as f64;
    let mut target_rows = (target_columns / adjusted_aspect).round();
    if !(target_rows >= 1.0) {
        // also catches NaN from degenerate input
        target_rows = 1.0;
    }

    GridGeometry {
        columns: round_even(target_columns),
        rows: round_even(target_rows),
    }
}

/// Round to the nearest even integer, never returning 0. Values beyond the
/// `u32` range settle on the largest even `u32`.
fn round_even(x: f64) -> u32 {
    let half = (x / 2.0).round().min((u32::MAX / 2) as f64);
    let even = half as u32 * 2;
    if even == 0 {
        2
    } else {
        even
    }
}

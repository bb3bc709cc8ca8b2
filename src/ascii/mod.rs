//! ASCII presentation of luminance frames.
//!
//! 1. **Geometry** - size the character grid so the picture keeps its
//!    display aspect ratio once drawn with tall terminal cells
//! 2. **Ramp** - map each 8-bit luminance sample to one of five glyphs
//! 3. **Render** - write a frame to the terminal, one line per grid row

mod geometry;
mod ramp;
mod render;

pub use geometry::{display_aspect, resolve, GridGeometry, CHAR_CELL_ASPECT, MAX_COLUMNS};
pub use ramp::{GlyphRamp, BUCKET_WIDTH, DEFAULT_RAMP, RAMP_LEN};
pub use render::{render, render_to_string, CURSOR_HOME};

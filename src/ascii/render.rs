//! Glyph grid rendering to a terminal-like writer.

use std::io::Write;

use super::ramp::GlyphRamp;
use crate::frame::{Frame, PixelFormat};

/// Move the cursor to the top-left corner (row 1, column 1).
pub const CURSOR_HOME: &str = "\x1b[H";

/// Render a luminance frame as a glyph grid.
///
/// Emits [`CURSOR_HOME`], then one newline-terminated line per frame row,
/// and flushes the writer so the frame is visible before the next one is
/// produced.
///
/// The frame must be single-channel 8-bit luminance. Any other format is
/// a caller bug; it is caught by a debug assertion only.
pub fn render<W: Write>(frame: &Frame, ramp: &GlyphRamp, out: &mut W) -> std::io::Result<()> {
    debug_assert_eq!(frame.format, PixelFormat::Gray8, "render needs gray8 input");

    // Build the whole grid first and write it in one call
    let mut output =
        String::with_capacity(CURSOR_HOME.len() + (frame.width as usize + 1) * frame.height as usize);
    output.push_str(CURSOR_HOME);
    for y in 0..frame.height {
        for &sample in frame.row(y) {
            output.push(ramp.glyph(sample));
        }
        output.push('\n');
    }

    out.write_all(output.as_bytes())?;
    out.flush()
}

/// Render into a `String`, without the cursor sequence. Useful for logs and tests.
pub fn render_to_string(frame: &Frame, ramp: &GlyphRamp) -> String {
    let mut buf = Vec::new();
    // Writing to a Vec cannot fail
    let _ = render(frame, ramp, &mut buf);
    String::from_utf8_lossy(&buf[CURSOR_HOME.len()..]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Plane;

    #[test]
    fn test_render_two_by_two() {
        let frame = Frame::gray(2, 2, vec![0, 255, 255, 0]).unwrap();
        let mut out = Vec::new();
        render(&frame, &GlyphRamp::default(), &mut out).unwrap();
        assert_eq!(out, b"\x1b[H #\n# \n");
    }

    #[test]
    fn test_render_preserves_row_major_order() {
        let frame = Frame::gray(3, 2, vec![0, 60, 110, 160, 210, 255]).unwrap();
        assert_eq!(render_to_string(&frame, &GlyphRamp::default()), " .-\n+##\n");
    }

    #[test]
    fn test_render_skips_stride_padding() {
        let mut frame = Frame::gray(2, 2, vec![0; 4]).unwrap();
        frame.planes[0] = Plane {
            data: vec![255, 0, 99, 99, 0, 255, 99, 99],
            stride: 4,
        };
        assert_eq!(render_to_string(&frame, &GlyphRamp::default()), "# \n #\n");
    }

    #[test]
    fn test_render_flushes() {
        struct FlushTracker {
            data: Vec<u8>,
            flushed: bool,
        }
        impl Write for FlushTracker {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.data.extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                self.flushed = true;
                Ok(())
            }
        }

        let frame = Frame::gray(2, 2, vec![0; 4]).unwrap();
        let mut out = FlushTracker {
            data: Vec::new(),
            flushed: false,
        };
        render(&frame, &GlyphRamp::default(), &mut out).unwrap();
        assert!(out.flushed);
        assert!(out.data.starts_with(CURSOR_HOME.as_bytes()));
    }

    #[test]
    fn test_render_custom_ramp() {
        let ramp = GlyphRamp::new(['a', 'b', 'c', 'd', 'e']);
        let frame = Frame::gray(5, 1, vec![0, 52, 104, 156, 208]).unwrap();
        assert_eq!(render_to_string(&frame, &ramp), "abcde\n");
    }
}

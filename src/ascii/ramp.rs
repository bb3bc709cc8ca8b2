//! Glyph ramp definitions for luminance quantization.

use std::fmt;

/// Default 5-level ramp, ordered from darkest (space) to brightest (#).
pub const DEFAULT_RAMP: [char; RAMP_LEN] = [' ', '.', '-', '+', '#'];

/// Number of glyphs in a ramp.
pub const RAMP_LEN: usize = 5;

/// Width of one luminance bucket. The last bucket also covers 208-255.
pub const BUCKET_WIDTH: u8 = 52;

/// An ordered set of glyphs from darkest to brightest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphRamp {
    glyphs: [char; RAMP_LEN],
}

impl GlyphRamp {
    pub const fn new(glyphs: [char; RAMP_LEN]) -> Self {
        Self { glyphs }
    }

    /// Build a ramp from a string of exactly five characters.
    pub fn from_str_exact(s: &str) -> Option<Self> {
        let chars: Vec<char> = s.chars().collect();
        let glyphs: [char; RAMP_LEN] = chars.try_into().ok()?;
        Some(Self { glyphs })
    }

    /// Glyph for a luminance sample.
    #[inline]
    pub fn glyph(&self, sample: u8) -> char {
        self.glyphs[(sample / BUCKET_WIDTH) as usize]
    }

    /// True when every glyph is a single-byte ASCII character.
    pub fn is_ascii(&self) -> bool {
        self.glyphs.iter().all(char::is_ascii)
    }
}

impl Default for GlyphRamp {
    fn default() -> Self {
        Self::new(DEFAULT_RAMP)
    }
}

impl fmt::Display for GlyphRamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.glyphs {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

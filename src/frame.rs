//! Frame buffers and the small value types that describe them.
//!
//! A [`Frame`] owns its sample planes. Ownership moves explicitly from the
//! media source to the transform stage and on to the renderer, so a buffer
//! always has exactly one holder and is released when that holder drops it.

use std::fmt;

/// A rational number, used for sample aspect ratios and time bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /// The 1:1 ratio.
    pub const ONE: Rational = Rational { num: 1, den: 1 };

    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// A ratio is usable only when both components are positive.
    pub fn is_valid(&self) -> bool {
        self.num > 0 && self.den > 0
    }

    /// Real value of the ratio, or `None` when it is not valid.
    pub fn to_f64(&self) -> Option<f64> {
        if self.is_valid() {
            Some(self.num as f64 / self.den as f64)
        } else {
            None
        }
    }

    /// Real value, treating an absent or invalid ratio as 1:1.
    pub fn to_f64_or_one(&self) -> f64 {
        self.to_f64().unwrap_or(1.0)
    }

    /// Parse `"a:b"` or `"a/b"` (ffprobe emits both styles).
    pub fn parse(s: &str) -> Option<Self> {
        let (num, den) = s.split_once([':', '/'])?;
        Some(Self {
            num: num.trim().parse().ok()?,
            den: den.trim().parse().ok()?,
        })
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.num, self.den)
    }
}

/// Channel layout and bit depth of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Single-channel 8-bit luminance
    Gray8,
    /// Packed 8-bit R, G, B
    Rgb24,
    /// Packed 8-bit B, G, R
    Bgr24,
    /// Packed 8-bit R, G, B, A
    Rgba,
    /// Planar Y, U, V with 2x2 chroma subsampling, limited range
    Yuv420p,
    /// Planar Y, U, V with 2x2 chroma subsampling, full range
    Yuvj420p,
}

impl PixelFormat {
    /// Name as understood by ffmpeg's `-pix_fmt` and reported by ffprobe.
    pub fn name(&self) -> &'static str {
        match self {
            PixelFormat::Gray8 => "gray",
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Bgr24 => "bgr24",
            PixelFormat::Rgba => "rgba",
            PixelFormat::Yuv420p => "yuv420p",
            PixelFormat::Yuvj420p => "yuvj420p",
        }
    }

    /// Look up a format by its ffmpeg name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "gray" | "gray8" => Some(PixelFormat::Gray8),
            "rgb24" => Some(PixelFormat::Rgb24),
            "bgr24" => Some(PixelFormat::Bgr24),
            "rgba" => Some(PixelFormat::Rgba),
            "yuv420p" => Some(PixelFormat::Yuv420p),
            "yuvj420p" => Some(PixelFormat::Yuvj420p),
            _ => None,
        }
    }

    pub fn is_planar(&self) -> bool {
        matches!(self, PixelFormat::Yuv420p | PixelFormat::Yuvj420p)
    }

    /// Bytes per pixel of the first (or only) plane.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Gray8 | PixelFormat::Yuv420p | PixelFormat::Yuvj420p => 1,
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => 3,
            PixelFormat::Rgba => 4,
        }
    }

    /// Width and height of every plane for a picture of the given size.
    pub fn plane_dims(&self, width: u32, height: u32) -> Vec<(u32, u32)> {
        if self.is_planar() {
            let cw = width.div_ceil(2);
            let ch = height.div_ceil(2);
            vec![(width, height), (cw, ch), (cw, ch)]
        } else {
            vec![(width, height)]
        }
    }

    /// Total tightly-packed byte size of one picture.
    pub fn frame_size(&self, width: u32, height: u32) -> usize {
        let bpp = self.bytes_per_pixel();
        self.plane_dims(width, height)
            .iter()
            .map(|&(w, h)| w as usize * h as usize * bpp)
            .sum()
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One plane of samples with its row stride in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane {
    pub data: Vec<u8>,
    pub stride: usize,
}

impl Plane {
    /// Row `y`, `len` bytes long.
    pub fn row(&self, y: usize, len: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + len]
    }
}

/// A decoded or transformed picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub planes: Vec<Plane>,
    /// Sample aspect ratio; invalid means 1:1
    pub sar: Rational,
    /// Presentation timestamp in stream time-base units
    pub pts: Option<i64>,
}

impl Frame {
    /// Build a frame from tightly-packed bytes, splitting planar formats.
    ///
    /// Returns `None` when `data` is not exactly one picture long.
    pub fn from_packed(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || data.len() != format.frame_size(width, height) {
            return None;
        }
        let bpp = format.bytes_per_pixel();
        let dims = format.plane_dims(width, height);
        let planes = if dims.len() == 1 {
            vec![Plane {
                data,
                stride: width as usize * bpp,
            }]
        } else {
            let mut planes = Vec::with_capacity(dims.len());
            let mut offset = 0;
            for (w, h) in dims {
                let len = w as usize * h as usize * bpp;
                planes.push(Plane {
                    data: data[offset..offset + len].to_vec(),
                    stride: w as usize * bpp,
                });
                offset += len;
            }
            planes
        };
        Some(Self {
            width,
            height,
            format,
            planes,
            sar: Rational::ONE,
            pts: None,
        })
    }

    /// Single-channel luminance frame from row-major samples.
    pub fn gray(width: u32, height: u32, samples: Vec<u8>) -> Option<Self> {
        Self::from_packed(width, height, PixelFormat::Gray8, samples)
    }

    /// Stride of the first plane, in bytes.
    pub fn stride(&self) -> usize {
        self.planes.first().map_or(0, |p| p.stride)
    }

    /// Visible bytes of row `y` in the first plane.
    pub fn row(&self, y: u32) -> &[u8] {
        let len = self.width as usize * self.format.bytes_per_pixel();
        self.planes[0].row(y as usize, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rational_parse() {
        assert_eq!(Rational::parse("16:11"), Some(Rational::new(16, 11)));
        assert_eq!(Rational::parse("1/25"), Some(Rational::new(1, 25)));
        assert_eq!(Rational::parse("0:1"), Some(Rational::new(0, 1)));
        assert_eq!(Rational::parse("N/A"), None);
    }

    #[test]
    fn test_rational_invalid_treated_as_one() {
        assert_eq!(Rational::new(0, 1).to_f64_or_one(), 1.0);
        assert_eq!(Rational::new(1, 0).to_f64_or_one(), 1.0);
        assert_eq!(Rational::new(-4, 3).to_f64_or_one(), 1.0);
        assert_eq!(Rational::new(4, 3).to_f64_or_one(), 4.0 / 3.0);
    }

    #[test]
    fn test_pixel_format_names_round_trip() {
        for fmt in [
            PixelFormat::Gray8,
            PixelFormat::Rgb24,
            PixelFormat::Bgr24,
            PixelFormat::Rgba,
            PixelFormat::Yuv420p,
            PixelFormat::Yuvj420p,
        ] {
            assert_eq!(PixelFormat::from_name(fmt.name()), Some(fmt));
        }
        assert_eq!(PixelFormat::from_name("yuv444p10le"), None);
    }

    #[test]
    fn test_yuv420p_frame_size_odd_dimensions() {
        // 5x3 luma, 3x2 chroma planes
        assert_eq!(PixelFormat::Yuv420p.frame_size(5, 3), 15 + 6 + 6);
    }

    #[test]
    fn test_from_packed_splits_planes() {
        let data: Vec<u8> = (0..6).collect();
        let frame = Frame::from_packed(2, 2, PixelFormat::Yuv420p, data).unwrap();
        assert_eq!(frame.planes.len(), 3);
        assert_eq!(frame.planes[0].data, vec![0, 1, 2, 3]);
        assert_eq!(frame.planes[1].data, vec![4]);
        assert_eq!(frame.planes[2].data, vec![5]);
    }

    #[test]
    fn test_from_packed_rejects_wrong_length() {
        assert!(Frame::from_packed(2, 2, PixelFormat::Rgb24, vec![0; 11]).is_none());
        assert!(Frame::gray(0, 2, vec![]).is_none());
    }

    #[test]
    fn test_row_respects_stride() {
        let mut frame = Frame::gray(2, 2, vec![1, 2, 3, 4]).unwrap();
        frame.planes[0] = Plane {
            data: vec![1, 2, 0, 3, 4, 0],
            stride: 3,
        };
        assert_eq!(frame.row(0), &[1, 2]);
        assert_eq!(frame.row(1), &[3, 4]);
    }
}

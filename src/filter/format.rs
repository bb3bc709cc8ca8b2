//! `format` filter: reduce frames to single-channel 8-bit luminance.

use super::parse::FilterSpec;
use super::{FilterError, FilterNode, FrameSpec, GraphBuildError};
use crate::frame::{Frame, PixelFormat, Plane};

/// Convert frames to a target pixel format.
///
/// Only conversion to [`PixelFormat::Gray8`] is implemented; any other target
/// is accepted only when the input already has that format.
#[derive(Debug)]
pub struct FormatFilter {
    target: PixelFormat,
}

impl FormatFilter {
    pub fn new(target: PixelFormat) -> Self {
        Self { target }
    }

    /// Build from `format=gray` or `format=pix_fmts=gray`.
    pub fn from_spec(spec: &FilterSpec) -> Result<Self, GraphBuildError> {
        let name = spec
            .arg("pix_fmts", 0)
            .ok_or_else(|| GraphBuildError::Parse {
                description: spec.name.clone(),
                reason: "format needs a pixel format".to_string(),
            })?;
        let target = PixelFormat::from_name(name).ok_or_else(|| GraphBuildError::Parse {
            description: spec.name.clone(),
            reason: format!("unknown pixel format '{}'", name),
        })?;
        Ok(Self::new(target))
    }
}

impl FilterNode for FormatFilter {
    fn name(&self) -> &str {
        "format"
    }

    fn negotiate(&mut self, input: &FrameSpec) -> Result<FrameSpec, GraphBuildError> {
        if input.format != self.target && self.target != PixelFormat::Gray8 {
            return Err(GraphBuildError::Negotiation {
                node: self.name().to_string(),
                reason: format!("no conversion from {} to {}", input.format, self.target),
            });
        }
        Ok(FrameSpec {
            format: self.target,
            ..input.clone()
        })
    }

    fn process(&mut self, frame: Frame) -> Result<Frame, FilterError> {
        if frame.format == self.target {
            return Ok(frame);
        }
        let samples = to_luminance(&frame);
        let stride = frame.width as usize;
        Ok(Frame {
            format: PixelFormat::Gray8,
            planes: vec![Plane {
                data: samples,
                stride,
            }],
            ..frame
        })
    }
}

/// Luminance of every pixel, row-major, tightly packed.
///
/// Packed RGB uses the ITU-R BT.601 weights with integer math
/// (299 + 587 + 114 = 1000). Limited-range YUV luma is expanded from
/// 16-235 to the full 0-255 range; full-range luma is copied.
pub fn to_luminance(frame: &Frame) -> Vec<u8> {
    let pixel_count = frame.width as usize * frame.height as usize;
    let mut gray = Vec::with_capacity(pixel_count);

    for y in 0..frame.height {
        let row = frame.row(y);
        match frame.format {
            PixelFormat::Gray8 | PixelFormat::Yuvj420p => gray.extend_from_slice(row),
            PixelFormat::Yuv420p => gray.extend(row.iter().map(|&l| expand_limited_luma(l))),
            PixelFormat::Rgb24 => {
                gray.extend(row.chunks_exact(3).map(|p| bt601(p[0], p[1], p[2])));
            }
            PixelFormat::Bgr24 => {
                gray.extend(row.chunks_exact(3).map(|p| bt601(p[2], p[1], p[0])));
            }
            PixelFormat::Rgba => {
                gray.extend(row.chunks_exact(4).map(|p| bt601(p[0], p[1], p[2])));
            }
        }
    }

    gray
}

#[inline]
fn bt601(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

#[inline]
fn expand_limited_luma(l: u8) -> u8 {
    let v = (l.saturating_sub(16) as u32 * 255 + 109) / 219;
    v.min(255) as u8
}

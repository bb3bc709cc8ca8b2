//! `scale` filter: area-averaging resampler that works on every plane.

use super::parse::FilterSpec;
use super::{FilterError, FilterNode, FrameSpec, GraphBuildError};
use crate::frame::{Frame, Plane, Rational};

/// Resize frames to a fixed output size.
///
/// Each output sample is the average of the source samples its cell
/// covers. When an axis is enlarged a cell covers less than one source
/// sample, and the nearest sample is used instead.
#[derive(Debug)]
pub struct ScaleFilter {
    width: u32,
    height: u32,
}

impl ScaleFilter {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Build from `scale=W:H` or `scale=w=W:h=H`.
    pub fn from_spec(spec: &FilterSpec) -> Result<Self, GraphBuildError> {
        let dim = |key: &str, position: usize| -> Result<u32, GraphBuildError> {
            let raw = spec.arg(key, position).ok_or_else(|| GraphBuildError::Parse {
                description: spec.name.clone(),
                reason: format!("scale needs a '{}' argument", key),
            })?;
            match raw.parse::<u32>() {
                Ok(v) if v > 0 => Ok(v),
                _ => Err(GraphBuildError::Parse {
                    description: spec.name.clone(),
                    reason: format!("invalid scale {} '{}'", key, raw),
                }),
            }
        };
        Ok(Self::new(dim("w", 0)?, dim("h", 1)?))
    }
}

impl FilterNode for ScaleFilter {
    fn name(&self) -> &str {
        "scale"
    }

    fn negotiate(&mut self, input: &FrameSpec) -> Result<FrameSpec, GraphBuildError> {
        let output = FrameSpec {
            width: self.width,
            height: self.height,
            sar: scaled_sar(input.sar, input.width, input.height, self.width, self.height),
            ..input.clone()
        };
        Ok(output)
    }

    fn process(&mut self, frame: Frame) -> Result<Frame, FilterError> {
        if frame.width == self.width && frame.height == self.height {
            return Ok(frame);
        }

        let format = frame.format;
        let bpp = format.bytes_per_pixel();
        let src_dims = format.plane_dims(frame.width, frame.height);
        let dst_dims = format.plane_dims(self.width, self.height);
        if frame.planes.len() != src_dims.len() {
            return Err(FilterError::Process {
                node: self.name().to_string(),
                reason: format!(
                    "{} frame has {} planes, expected {}",
                    format,
                    frame.planes.len(),
                    src_dims.len()
                ),
            });
        }

        let planes = frame
            .planes
            .iter()
            .zip(src_dims.iter().zip(dst_dims.iter()))
            .map(|(plane, (&(sw, sh), &(dw, dh)))| resample_plane(plane, sw, sh, bpp, dw, dh))
            .collect();

        Ok(Frame {
            width: self.width,
            height: self.height,
            format,
            planes,
            sar: scaled_sar(frame.sar, frame.width, frame.height, self.width, self.height),
            pts: frame.pts,
        })
    }
}

/// Output SAR that keeps the display aspect ratio after a resize.
///
/// An invalid input SAR stays invalid (unknown remains unknown).
pub fn scaled_sar(sar: Rational, src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Rational {
    if !sar.is_valid() {
        return sar;
    }
    let num = sar.num as i64 * dst_h as i64 * src_w as i64;
    let den = sar.den as i64 * dst_w as i64 * src_h as i64;
    let g = gcd(num, den).max(1);
    let (num, den) = (num / g, den / g);
    match (i32::try_from(num), i32::try_from(den)) {
        (Ok(num), Ok(den)) => Rational::new(num, den),
        // Too large to express exactly; fall back to a rounded ratio
        _ => Rational::new(((num as f64 / den as f64) * 10_000.0).round() as i32, 10_000),
    }
}

fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 {
        a.abs()
    } else {
        gcd(b, a % b)
    }
}

/// Resample one plane of `channels`-interleaved samples.
fn resample_plane(src: &Plane, sw: u32, sh: u32, channels: usize, dw: u32, dh: u32) -> Plane {
    let mut data = Vec::with_capacity(dw as usize * dh as usize * channels);

    for cy in 0..dh {
        let (start_y, end_y) = cell_span(cy, sh, dh);
        for cx in 0..dw {
            let (start_x, end_x) = cell_span(cx, sw, dw);
            let count = (end_y - start_y) * (end_x - start_x);

            for c in 0..channels {
                let mut sum = 0u32;
                for py in start_y..end_y {
                    let row = py as usize * src.stride;
                    for px in start_x..end_x {
                        sum += src.data[row + px as usize * channels + c] as u32;
                    }
                }
                // Rounded average
                data.push(((sum + count / 2) / count) as u8);
            }
        }
    }

    Plane {
        data,
        stride: dw as usize * channels,
    }
}

/// Source sample range `[start, end)` covered by output cell `i` when
/// `src` samples map onto `dst` cells, never empty.
fn cell_span(i: u32, src: u32, dst: u32) -> (u32, u32) {
    let edge = |k: u32| (k as u64 * src as u64 / dst as u64) as u32;
    let start = edge(i).min(src - 1);
    let end = edge(i + 1).clamp(start + 1, src);
    (start, end)
}

//! Stream discovery with `ffprobe`.

use std::path::Path;
use std::process::{Command, Stdio};

use serde::Deserialize;

use super::{SourceError, StreamInfo};
use crate::frame::{PixelFormat, Rational};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    index: usize,
    width: Option<u32>,
    height: Option<u32>,
    pix_fmt: Option<String>,
    sample_aspect_ratio: Option<String>,
    time_base: Option<String>,
    r_frame_rate: Option<String>,
}

/// Probe result before the output pixel format is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedStream {
    pub info: StreamInfo,
    /// Pixel format name as reported by ffprobe
    pub native_format: String,
}

/// Run ffprobe on `path` and describe its first video stream.
pub fn probe(ffprobe: &str, path: &Path) -> Result<ProbedStream, SourceError> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=index,width,height,pix_fmt,sample_aspect_ratio,time_base,r_frame_rate",
            "-of",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::ToolNotFound {
                    tool: ffprobe.to_string(),
                }
            } else {
                SourceError::Open {
                    path: path.to_path_buf(),
                    reason: format!("failed to run {}: {}", ffprobe, e),
                }
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SourceError::Open {
            path: path.to_path_buf(),
            reason: stderr.trim().to_string(),
        });
    }

    parse_probe_output(&output.stdout, path)
}

/// Interpret ffprobe's JSON output.
pub fn parse_probe_output(json: &[u8], path: &Path) -> Result<ProbedStream, SourceError> {
    let parsed: ProbeOutput = serde_json::from_slice(json).map_err(|e| SourceError::Open {
        path: path.to_path_buf(),
        reason: format!("unreadable ffprobe output: {}", e),
    })?;

    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::NoVideoStream(path.to_path_buf()))?;

    let open_err = |reason: &str| SourceError::Open {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let width = stream.width.filter(|&w| w > 0).ok_or_else(|| open_err("video stream has no width"))?;
    let height = stream
        .height
        .filter(|&h| h > 0)
        .ok_or_else(|| open_err("video stream has no height"))?;
    let native_format = stream
        .pix_fmt
        .ok_or_else(|| open_err("video stream has no pixel format"))?;

    // Formats the transform stage cannot read are delivered as rgb24
    let format = PixelFormat::from_name(&native_format).unwrap_or_else(|| {
        log::debug!("pixel format {} will be converted to rgb24 by ffmpeg", native_format);
        PixelFormat::Rgb24
    });

    let sar = stream
        .sample_aspect_ratio
        .as_deref()
        .and_then(Rational::parse)
        .unwrap_or(Rational::new(0, 1));
    let time_base = stream
        .time_base
        .as_deref()
        .and_then(Rational::parse)
        .filter(Rational::is_valid)
        .ok_or_else(|| open_err("video stream has no time base"))?;
    let frame_rate = stream
        .r_frame_rate
        .as_deref()
        .and_then(Rational::parse)
        .filter(Rational::is_valid);

    Ok(ProbedStream {
        info: StreamInfo {
            index: stream.index,
            width,
            height,
            format,
            sar,
            time_base,
            frame_rate,
        },
        native_format,
    })
}

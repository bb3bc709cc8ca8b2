//! Media sources: demultiplexing and decoding collaborators.
//!
//! A [`MediaSource`] yields elementary [`Unit`]s for the selected video
//! stream (and possibly others), and a [`Decoder`] turns units into
//! [`Frame`]s. The shipped implementation drives the `ffmpeg` and `ffprobe`
//! binaries; see [`FfmpegSource`].

mod ffmpeg;
mod probe;
mod rawvideo;

use std::path::PathBuf;

pub use ffmpeg::{FfmpegSource, FfmpegTools};
pub use probe::{parse_probe_output, probe, ProbedStream};
pub use rawvideo::RawVideoDecoder;

use crate::filter::FrameSpec;
use crate::frame::{Frame, PixelFormat, Rational};

/// Parameters of the selected video stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Index of the stream inside the container
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Sample aspect ratio; invalid means 1:1
    pub sar: Rational,
    pub time_base: Rational,
    /// Average frame rate, if known
    pub frame_rate: Option<Rational>,
}

impl StreamInfo {
    /// Declaration for the transform stage's source node.
    pub fn frame_spec(&self) -> FrameSpec {
        FrameSpec {
            width: self.width,
            height: self.height,
            format: self.format,
            sar: self.sar,
            time_base: self.time_base,
        }
    }
}

/// One elementary unit read from the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub stream_index: usize,
    pub data: Vec<u8>,
}

/// Result of a read.
#[derive(Debug)]
pub enum ReadOutcome {
    Unit(Unit),
    EndOfStream,
}

/// Result of asking the decoder for a frame.
#[derive(Debug)]
pub enum Decoded {
    /// A decoded frame together with its best-effort timestamp
    Frame {
        frame: Frame,
        best_effort_timestamp: Option<i64>,
    },
    /// The decoder needs more units before it can produce a frame
    NeedsInput,
    /// End of input was signalled and every buffered frame has been returned
    EndOfStream,
}

/// Errors raised by media sources and decoders.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Cannot open input file {}: {reason}", .path.display())]
    Open { path: PathBuf, reason: String },

    #[error("Cannot find a video stream in the input file {}", .0.display())]
    NoVideoStream(PathBuf),

    #[error("{tool} not found. Please install FFmpeg (it provides {tool}) and make sure it is on PATH")]
    ToolNotFound { tool: String },

    #[error("Error reading from input: {0}")]
    Read(String),

    #[error("Error while decoding: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Demultiplexer for one input.
pub trait MediaSource {
    /// The selected video stream.
    fn stream_info(&self) -> &StreamInfo;

    /// Read the next unit, from any stream.
    fn read_unit(&mut self) -> Result<ReadOutcome, SourceError>;
}

/// Decoder for the selected video stream.
pub trait Decoder {
    /// Submit a unit of the selected stream.
    fn send(&mut self, unit: Unit) -> Result<(), SourceError>;

    /// Signal that no more units will follow.
    fn send_eof(&mut self);

    /// Take the next ready frame.
    fn receive(&mut self) -> Result<Decoded, SourceError>;
}

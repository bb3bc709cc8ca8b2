//! Graph endpoints: the buffer source frames enter through and the buffer
//! sink transformed frames are collected from.

use super::{FilterError, FrameSpec, GraphBuildError};
use crate::frame::{Frame, PixelFormat};

/// Entry node of a transform graph.
///
/// Declares the exact geometry and format of the frames that will be
/// pushed, and refuses frames that do not match.
#[derive(Debug)]
pub struct BufferSource {
    spec: FrameSpec,
}

impl BufferSource {
    pub fn new(spec: FrameSpec) -> Result<Self, GraphBuildError> {
        if spec.width == 0 || spec.height == 0 {
            return Err(GraphBuildError::InvalidSource(format!(
                "video size {}x{} is empty",
                spec.width, spec.height
            )));
        }
        if !spec.time_base.is_valid() {
            return Err(GraphBuildError::InvalidSource(format!(
                "time base {} is invalid",
                spec.time_base
            )));
        }
        Ok(Self { spec })
    }

    /// The stream parameters this source was declared with.
    pub fn declare_format(&self) -> &FrameSpec {
        &self.spec
    }

    /// Accept a frame if it matches the declaration.
    pub fn admit(&self, frame: &Frame) -> Result<(), FilterError> {
        if frame.width != self.spec.width
            || frame.height != self.spec.height
            || frame.format != self.spec.format
        {
            return Err(FilterError::InputMismatch {
                expected: format!("{}x{} {}", self.spec.width, self.spec.height, self.spec.format),
                actual: format!("{}x{} {}", frame.width, frame.height, frame.format),
            });
        }
        Ok(())
    }
}

/// Exit node of a transform graph.
///
/// Constrained to a set of pixel formats at construction; negotiation fails
/// if the chain feeding it produces anything else.
#[derive(Debug)]
pub struct BufferSink {
    accepted: Vec<PixelFormat>,
    slot: Option<Frame>,
}

impl BufferSink {
    pub fn new(accepted: &[PixelFormat]) -> Self {
        Self {
            accepted: accepted.to_vec(),
            slot: None,
        }
    }

    /// A sink that only accepts single-channel 8-bit luminance.
    pub fn luminance() -> Self {
        Self::new(&[PixelFormat::Gray8])
    }

    pub fn negotiate(&self, input: &FrameSpec) -> Result<(), GraphBuildError> {
        if self.accepted.contains(&input.format) {
            Ok(())
        } else {
            Err(GraphBuildError::Negotiation {
                node: "buffersink".to_string(),
                reason: format!(
                    "sink accepts [{}], chain produces {}",
                    self.accepted
                        .iter()
                        .map(|f| f.name())
                        .collect::<Vec<_>>()
                        .join(", "),
                    input.format
                ),
            })
        }
    }

    /// Store a transformed frame. The sink holds one frame; it must be
    /// produced before the next one can be consumed.
    pub fn consume(&mut self, frame: Frame) -> Result<(), FilterError> {
        if self.slot.is_some() {
            return Err(FilterError::OutputPending);
        }
        self.slot = Some(frame);
        Ok(())
    }

    /// Hand out the held frame. Ownership moves to the caller.
    pub fn produce(&mut self) -> Option<Frame> {
        self.slot.take()
    }

    pub fn is_occupied(&self) -> bool {
        self.slot.is_some()
    }
}

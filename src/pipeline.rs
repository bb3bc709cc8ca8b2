//! Pipeline driver.
//!
//! Opens an input, sizes the character grid from the selected stream,
//! builds the transform stage, then reads and decodes until enough frames
//! have been rendered or the input runs out. Every resource acquired along
//! the way is owned by [`Pipeline::run`]'s stack frame and released when it
//! returns, on success and on every failure path.
//!
//! ```text
//! Idle -> Opened -> FiltersReady -> Running -> FrameDisplayed
//!                                           -> Exhausted
//! (any non-terminal state)                  -> Failed(kind)
//! ```

mod errors;

use std::io::Write;

pub use errors::{ErrorKind, PreviewError};

use crate::ascii::{self, GlyphRamp, GridGeometry, CHAR_CELL_ASPECT, MAX_COLUMNS};
use crate::config::{ConfigError, PreviewConfig};
use crate::filter::{FilterError, FrameSpec, GraphBuildError, Pulled, TransformGraph, TransformStage};
use crate::frame::{Frame, PixelFormat};
use crate::source::{Decoded, Decoder, MediaSource, ReadOutcome, SourceError};

/// Lifecycle of a preview run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Opened,
    FiltersReady,
    Running,
    FrameDisplayed,
    Exhausted,
    Failed(ErrorKind),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::FrameDisplayed | PipelineState::Exhausted | PipelineState::Failed(_)
        )
    }
}

/// Builds the transform stage for a stream and grid.
pub type StageBuilder =
    fn(FrameSpec, GridGeometry) -> Result<Box<dyn TransformStage>, GraphBuildError>;

/// The built-in stage: `scale=C:R,format=gray` between a buffer source and
/// a luminance sink.
pub fn luminance_stage(
    input: FrameSpec,
    grid: GridGeometry,
) -> Result<Box<dyn TransformStage>, GraphBuildError> {
    Ok(Box::new(TransformGraph::for_grid(input, grid)?))
}

/// Summary of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub geometry: GridGeometry,
    pub frames_displayed: u32,
}

/// Drives one input from open to teardown.
#[derive(Debug)]
pub struct Pipeline {
    max_columns: u32,
    cell_aspect: f64,
    ramp: GlyphRamp,
    max_frames: u32,
    build_stage: StageBuilder,
    state: PipelineState,
    history: Vec<PipelineState>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            max_columns: MAX_COLUMNS,
            cell_aspect: CHAR_CELL_ASPECT,
            ramp: GlyphRamp::default(),
            max_frames: 1,
            build_stage: luminance_stage,
            state: PipelineState::Idle,
            history: Vec::new(),
        }
    }
}

impl Pipeline {
    pub fn new(config: &PreviewConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            max_columns: config.max_columns,
            cell_aspect: config.cell_aspect,
            ramp: config.glyph_ramp()?,
            max_frames: config.frames_to_display(),
            ..Self::default()
        })
    }

    /// Replace the transform stage constructor.
    pub fn with_stage_builder(mut self, build_stage: StageBuilder) -> Self {
        self.build_stage = build_stage;
        self
    }

    /// Current state; after [`run`](Self::run) returns this is terminal.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state entered during the last run, in order.
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Open the input with `open`, then render up to the configured number
    /// of frames to `out`.
    ///
    /// # Arguments
    /// * `open` - Opens the input and returns its source and a decoder for the selected stream
    /// * `out` - Terminal-like writer that receives the rendered grids
    ///
    /// # Returns
    /// The grid geometry and the number of frames shown, or the error that
    /// ended the run. Reaching the end of input without showing a frame is
    /// [`PreviewError::NoFrameAvailable`].
    pub fn run<S, D, O, W>(&mut self, open: O, out: &mut W) -> Result<Outcome, PreviewError>
    where
        S: MediaSource,
        D: Decoder,
        O: FnOnce() -> Result<(S, D), SourceError>,
        W: Write,
    {
        self.history.clear();
        self.enter(PipelineState::Idle);

        let result = self.drive(open, out);

        let end = match &result {
            Ok(_) => PipelineState::FrameDisplayed,
            Err(PreviewError::NoFrameAvailable) => PipelineState::Exhausted,
            Err(e) => PipelineState::Failed(e.kind()),
        };
        self.enter(end);
        result
    }

    fn enter(&mut self, next: PipelineState) {
        if !self.history.is_empty() {
            log::debug!("pipeline: {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        self.history.push(next);
    }

    fn drive<S, D, O, W>(&mut self, open: O, out: &mut W) -> Result<Outcome, PreviewError>
    where
        S: MediaSource,
        D: Decoder,
        O: FnOnce() -> Result<(S, D), SourceError>,
        W: Write,
    {
        let (mut source, mut decoder) = open().map_err(PreviewError::SourceOpen)?;
        self.enter(PipelineState::Opened);

        let info = source.stream_info().clone();
        let geometry = ascii::resolve(
            info.width,
            info.height,
            info.sar,
            self.max_columns,
            self.cell_aspect,
        );
        log::info!(
            "Input video resolution: {}x{} (Pixel Aspect Ratio: {}, Display Aspect Ratio: {:.6})",
            info.width,
            info.height,
            info.sar,
            ascii::display_aspect(info.width, info.height, info.sar)
        );
        log::info!(
            "Terminal character aspect ratio compensation: {:.6}",
            self.cell_aspect
        );
        log::info!("Output ASCII dimensions (characters): {}", geometry);

        let mut stage =
            (self.build_stage)(info.frame_spec(), geometry).map_err(PreviewError::GraphBuild)?;
        check_stage_output(stage.output_spec(), geometry)?;
        self.enter(PipelineState::FiltersReady);

        self.enter(PipelineState::Running);
        let mut displayed = 0;
        while displayed < self.max_frames {
            match source.read_unit().map_err(read_error)? {
                ReadOutcome::Unit(unit) if unit.stream_index != info.index => {
                    log::trace!("skipping unit from stream #{}", unit.stream_index);
                }
                ReadOutcome::Unit(unit) => {
                    decoder.send(unit).map_err(PreviewError::Decode)?;
                    displayed += self.drain_decoder(
                        &mut decoder,
                        stage.as_mut(),
                        out,
                        self.max_frames - displayed,
                    )?;
                }
                ReadOutcome::EndOfStream => {
                    log::debug!("end of input after {} frame(s)", displayed);
                    decoder.send_eof();
                    displayed += self.drain_decoder(
                        &mut decoder,
                        stage.as_mut(),
                        out,
                        self.max_frames - displayed,
                    )?;
                    stage.close();
                    displayed +=
                        self.pull_ready(stage.as_mut(), out, self.max_frames - displayed, true)?;
                    break;
                }
            }
        }

        if displayed == 0 {
            return Err(PreviewError::NoFrameAvailable);
        }
        Ok(Outcome {
            geometry,
            frames_displayed: displayed,
        })
    }

    /// Move every frame the decoder has ready through the stage, rendering
    /// at most `remaining` of them.
    fn drain_decoder<D: Decoder, W: Write>(
        &self,
        decoder: &mut D,
        stage: &mut dyn TransformStage,
        out: &mut W,
        remaining: u32,
    ) -> Result<u32, PreviewError> {
        let mut shown = 0;
        while shown < remaining {
            let (mut frame, best_effort_timestamp) =
                match decoder.receive().map_err(PreviewError::Decode)? {
                    Decoded::Frame {
                        frame,
                        best_effort_timestamp,
                    } => (frame, best_effort_timestamp),
                    Decoded::NeedsInput | Decoded::EndOfStream => break,
                };
            frame.pts = best_effort_timestamp;
            // The stage owns the decoded frame from here on
            stage.push(frame).map_err(PreviewError::Filter)?;
            shown += self.pull_ready(stage, out, remaining - shown, false)?;
        }
        Ok(shown)
    }

    /// Pull and render what the stage holds.
    fn pull_ready<W: Write>(
        &self,
        stage: &mut dyn TransformStage,
        out: &mut W,
        remaining: u32,
        closed: bool,
    ) -> Result<u32, PreviewError> {
        let mut shown = 0;
        while shown < remaining {
            match stage.pull().map_err(PreviewError::Filter)? {
                Pulled::Frame(frame) => {
                    self.display(&frame, out);
                    shown += 1;
                }
                Pulled::Drained if !closed => {
                    return Err(PreviewError::Filter(FilterError::Drained));
                }
                Pulled::Empty | Pulled::Drained => break,
            }
        }
        Ok(shown)
    }

    fn display<W: Write>(&self, frame: &Frame, out: &mut W) {
        log::debug!(
            "rendering {}x{} frame (pts {:?})",
            frame.width,
            frame.height,
            frame.pts
        );
        if let Err(e) = ascii::render(frame, &self.ramp, out) {
            log::warn!("Failed to write frame to terminal: {}", e);
        }
    }
}

/// Sources that decode internally report corrupt data from `read_unit`;
/// that is a decode failure, anything else is a read failure.
fn read_error(e: SourceError) -> PreviewError {
    match e {
        SourceError::Decode(_) => PreviewError::Decode(e),
        other => PreviewError::SourceRead(other),
    }
}

/// A stage must hand the renderer luminance frames of exactly the grid size.
fn check_stage_output(spec: &FrameSpec, grid: GridGeometry) -> Result<(), PreviewError> {
    if spec.format == PixelFormat::Gray8 && spec.width == grid.columns && spec.height == grid.rows {
        return Ok(());
    }
    Err(PreviewError::GraphBuild(GraphBuildError::Negotiation {
        node: "buffersink".to_string(),
        reason: format!(
            "stage produces {}x{} {}, renderer needs {} gray",
            spec.width, spec.height, spec.format, grid
        ),
    }))
}

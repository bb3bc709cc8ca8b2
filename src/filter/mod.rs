//! Transform stage: a filter graph that resizes decoded frames to the
//! character grid and reduces them to luminance.
//!
//! A graph has exactly one [`BufferSource`] and one [`BufferSink`]. The
//! filters between them come from a textual description such as
//! `scale=80:40,format=gray`:
//!
//! 1. **Parse** - the description is split into [`parse::FilterSpec`]s
//! 2. **Create** - each spec is turned into a [`FilterNode`]
//! 3. **Negotiate** - the source's declared [`FrameSpec`] is threaded through
//!    every node, and the sink checks the final format
//!
//! Once built the graph is immutable. Frames are pushed, transformed
//! synchronously, and held at the sink until pulled. The sink has room for
//! one frame, so every push must be followed by a pull.

mod buffer;
mod format;
pub mod parse;
mod scale;

use std::fmt;

pub use buffer::{BufferSink, BufferSource};
pub use format::{to_luminance, FormatFilter};
pub use scale::{scaled_sar, ScaleFilter};

use crate::ascii::GridGeometry;
use crate::frame::{Frame, PixelFormat, Rational};

/// Stream parameters negotiated between adjacent nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub sar: Rational,
    pub time_base: Rational,
}

impl fmt::Display for FrameSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "video_size={}x{}:pix_fmt={}:time_base={}/{}:pixel_aspect={}/{}",
            self.width,
            self.height,
            self.format,
            self.time_base.num,
            self.time_base.den,
            self.sar.num,
            self.sar.den
        )
    }
}

/// Errors raised while building or connecting a graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphBuildError {
    #[error("Filter '{0}' is not available")]
    UnknownFilter(String),

    #[error("Cannot parse graph description '{description}': {reason}")]
    Parse { description: String, reason: String },

    #[error("Cannot configure filter graph at '{node}': {reason}")]
    Negotiation { node: String, reason: String },

    #[error("Cannot create buffer source: {0}")]
    InvalidSource(String),
}

/// Errors raised while frames flow through a configured graph.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("Frame does not match source declaration: expected {expected}, got {actual}")]
    InputMismatch { expected: String, actual: String },

    #[error("Filter '{node}' failed: {reason}")]
    Process { node: String, reason: String },

    #[error("Transform stage is closed")]
    Closed,

    #[error("Transform stage reported end of output before end of input")]
    Drained,

    #[error("Transformed frame has not been pulled yet")]
    OutputPending,
}

/// A transform between the graph's source and sink.
pub trait FilterNode: fmt::Debug {
    /// Filter name as used in descriptions.
    fn name(&self) -> &str;

    /// Output parameters for the given input, or an error if the input
    /// cannot be handled.
    fn negotiate(&mut self, input: &FrameSpec) -> Result<FrameSpec, GraphBuildError>;

    /// Transform one frame.
    fn process(&mut self, frame: Frame) -> Result<Frame, FilterError>;
}

/// Result of asking the stage for output.
#[derive(Debug)]
pub enum Pulled {
    /// A transformed frame, now owned by the caller
    Frame(Frame),
    /// Nothing ready; push more input and retry
    Empty,
    /// No more output will ever be produced
    Drained,
}

/// The contract the pipeline driver uses to talk to a transform stage.
///
/// [`TransformGraph`] is the built-in implementation; anything that can
/// turn pushed frames into luminance frames of a fixed size can stand in.
pub trait TransformStage: fmt::Debug {
    /// Parameters of the frames this stage produces.
    fn output_spec(&self) -> &FrameSpec;

    /// Submit a frame. The stage takes ownership of it. A stage holds at
    /// most one transformed frame; pushing while it is unpulled fails with
    /// [`FilterError::OutputPending`].
    fn push(&mut self, frame: Frame) -> Result<(), FilterError>;

    /// Take the next transformed frame, if any.
    fn pull(&mut self) -> Result<Pulled, FilterError>;

    /// Signal end of input. Further pulls hand out what is held, then
    /// report [`Pulled::Drained`].
    fn close(&mut self);
}

/// Instantiate a filter by name.
fn create_filter(spec: &parse::FilterSpec) -> Result<Box<dyn FilterNode>, GraphBuildError> {
    match spec.name.as_str() {
        "scale" => Ok(Box::new(ScaleFilter::from_spec(spec)?)),
        "format" => Ok(Box::new(FormatFilter::from_spec(spec)?)),
        other => Err(GraphBuildError::UnknownFilter(other.to_string())),
    }
}

/// Filter description for a character grid.
pub fn grid_description(grid: GridGeometry) -> String {
    format!("scale={}:{},format=gray", grid.columns, grid.rows)
}

/// A configured source -> filters -> sink chain.
#[derive(Debug)]
pub struct TransformGraph {
    source: BufferSource,
    filters: Vec<Box<dyn FilterNode>>,
    sink: BufferSink,
    output: FrameSpec,
    closed: bool,
}

impl TransformGraph {
    /// Parse `description`, create its filters and negotiate the chain from
    /// `input` to `sink`.
    pub fn build(
        input: FrameSpec,
        description: &str,
        sink: BufferSink,
    ) -> Result<Self, GraphBuildError> {
        let source = BufferSource::new(input)?;
        log::debug!("buffer source: {}", source.declare_format());

        let chain = parse::parse_description(description)?;
        let mut filters = chain
            .iter()
            .map(create_filter)
            .collect::<Result<Vec<_>, _>>()?;

        let mut spec = source.declare_format().clone();
        for filter in filters.iter_mut() {
            spec = filter.negotiate(&spec)?;
            log::debug!("{} -> {}", filter.name(), spec);
        }
        sink.negotiate(&spec)?;

        Ok(Self {
            source,
            filters,
            sink,
            output: spec,
            closed: false,
        })
    }

    /// Graph that resizes to `grid` and converts to luminance.
    pub fn for_grid(input: FrameSpec, grid: GridGeometry) -> Result<Self, GraphBuildError> {
        let description = grid_description(grid);
        log::info!("Applying filter: \"{}\"", description);
        Self::build(input, &description, BufferSink::luminance())
    }

    /// Number of filters between source and sink.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl TransformStage for TransformGraph {
    fn output_spec(&self) -> &FrameSpec {
        &self.output
    }

    fn push(&mut self, frame: Frame) -> Result<(), FilterError> {
        if self.closed {
            return Err(FilterError::Closed);
        }
        if self.sink.is_occupied() {
            return Err(FilterError::OutputPending);
        }
        self.source.admit(&frame)?;

        let mut frame = frame;
        for filter in self.filters.iter_mut() {
            frame = filter.process(frame)?;
        }
        self.sink.consume(frame)
    }

    fn pull(&mut self) -> Result<Pulled, FilterError> {
        match self.sink.produce() {
            Some(frame) => Ok(Pulled::Frame(frame)),
            None if self.closed => Ok(Pulled::Drained),
            None => Ok(Pulled::Empty),
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

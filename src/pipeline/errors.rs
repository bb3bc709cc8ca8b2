//! Error types for preview runs.
//!
//! Every failure is fatal to the run and carries one of the [`ErrorKind`]s
//! so the final report can name where it came from.

use std::fmt;

use crate::filter::{FilterError, GraphBuildError};
use crate::source::SourceError;

/// Where a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SourceOpen,
    GraphBuild,
    SourceRead,
    Decode,
    Filter,
    NoFrameAvailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::SourceOpen => "SourceOpenError",
            ErrorKind::GraphBuild => "GraphBuildError",
            ErrorKind::SourceRead => "SourceReadError",
            ErrorKind::Decode => "DecodeError",
            ErrorKind::Filter => "FilterError",
            ErrorKind::NoFrameAvailable => "NoFrameAvailable",
        };
        f.write_str(name)
    }
}

/// Errors that end a preview run.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("{0}")]
    SourceOpen(#[source] SourceError),

    #[error("{0}")]
    GraphBuild(#[source] GraphBuildError),

    #[error("{0}")]
    SourceRead(#[source] SourceError),

    #[error("{0}")]
    Decode(#[source] SourceError),

    #[error("Error while filtering: {0}")]
    Filter(#[source] FilterError),

    #[error("End of file reached, but no video frame could be displayed")]
    NoFrameAvailable,
}

impl PreviewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PreviewError::SourceOpen(_) => ErrorKind::SourceOpen,
            PreviewError::GraphBuild(_) => ErrorKind::GraphBuild,
            PreviewError::SourceRead(_) => ErrorKind::SourceRead,
            PreviewError::Decode(_) => ErrorKind::Decode,
            PreviewError::Filter(_) => ErrorKind::Filter,
            PreviewError::NoFrameAvailable => ErrorKind::NoFrameAvailable,
        }
    }
}

//! glyphframe library crate.
//!
//! Decodes the first frame of a video file and renders it as an
//! aspect-correct ASCII grid. The binary is a thin wrapper around
//! [`pipeline::Pipeline`]; the modules are public for integration tests.

pub mod ascii;
pub mod cli;
pub mod config;
pub mod filter;
pub mod frame;
pub mod pipeline;
pub mod source;

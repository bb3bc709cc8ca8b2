//! CLI argument parsing with clap.

use clap::Parser;
use std::path::PathBuf;

/// Show the first video frame of a media file as ASCII art
#[derive(Parser, Debug)]
#[command(name = "glyphframe")]
#[command(version, about = "Preview a video frame as ASCII art in the terminal", long_about = None)]
pub struct Args {
    /// Media file to preview
    pub input: PathBuf,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Log filter implied by `-v` flags; `RUST_LOG` still takes precedence.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

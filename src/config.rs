//! Preview configuration.
//!
//! Defaults are built in. A TOML file is read only when one is passed
//! explicitly with `--config`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ascii::{GlyphRamp, CHAR_CELL_ASPECT, MAX_COLUMNS};
use crate::source::FfmpegTools;

/// Configuration for a preview run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Width of the character grid
    pub max_columns: u32,
    /// Terminal glyph width / height
    pub cell_aspect: f64,
    /// Five glyphs from darkest to brightest
    pub ramp: String,
    /// Frames to display before stopping
    pub max_frames: u32,
    /// ffmpeg binary name or path
    pub ffmpeg: String,
    /// ffprobe binary name or path
    pub ffprobe: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_columns: MAX_COLUMNS,
            cell_aspect: CHAR_CELL_ASPECT,
            ramp: " .-+#".to_string(),
            max_frames: 1,
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl PreviewConfig {
    /// Load configuration from `path`, or return the defaults when no path
    /// is given. An explicitly named file must exist and parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: PreviewConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        if !config.has_ascii_ramp() {
            log::warn!(
                "Glyph ramp {:?} contains non-ASCII characters; output needs a UTF-8 terminal",
                config.ramp
            );
        }
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_columns == 0 {
            return Err(ConfigError::Invalid("max_columns must be at least 1".to_string()));
        }
        if !(self.cell_aspect.is_finite() && self.cell_aspect > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "cell_aspect must be a positive number, got {}",
                self.cell_aspect
            )));
        }
        self.glyph_ramp()?;
        Ok(())
    }

    pub fn glyph_ramp(&self) -> Result<GlyphRamp, ConfigError> {
        GlyphRamp::from_str_exact(&self.ramp).ok_or_else(|| ConfigError::InvalidRamp(self.ramp.clone()))
    }

    /// True when the ramp renders as plain ASCII.
    pub fn has_ascii_ramp(&self) -> bool {
        self.glyph_ramp().is_ok_and(|ramp| ramp.is_ascii())
    }

    /// Frames to display; zero is treated as one.
    pub fn frames_to_display(&self) -> u32 {
        self.max_frames.max(1)
    }

    pub fn tools(&self) -> FfmpegTools {
        FfmpegTools {
            ffmpeg: self.ffmpeg.clone(),
            ffprobe: self.ffprobe.clone(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Glyph ramp must have exactly 5 characters, got {0:?}")]
    InvalidRamp(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_matches_constants() {
        let config = PreviewConfig::default();
        assert_eq!(config.max_columns, 80);
        assert_eq!(config.cell_aspect, 0.5);
        assert_eq!(config.glyph_ramp().unwrap(), GlyphRamp::default());
        assert_eq!(config.frames_to_display(), 1);
        assert_eq!(config.tools(), FfmpegTools::default());
        assert!(config.has_ascii_ramp());
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let config = PreviewConfig::load(None).unwrap();
        assert_eq!(config, PreviewConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_columns = 120").unwrap();
        writeln!(file, "ramp = \" ░▒▓█\"").unwrap();
        let config = PreviewConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_columns, 120);
        assert_eq!(config.glyph_ramp().unwrap().glyph(255), '█');
        // accepted, but flagged as needing a UTF-8 terminal
        assert!(!config.has_ascii_ramp());
        // untouched fields keep their defaults
        assert_eq!(config.cell_aspect, 0.5);
        assert_eq!(config.max_frames, 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = PreviewConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_columns = \"wide\"").unwrap();
        let err = PreviewConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_unknown_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "colour = true").unwrap();
        assert!(PreviewConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_bad_ramp_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ramp = \"@#\"").unwrap();
        let err = PreviewConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRamp(_)));
    }

    #[test]
    fn test_validate_ranges() {
        let config = PreviewConfig {
            max_columns: 0,
            ..PreviewConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = PreviewConfig {
            cell_aspect: -1.0,
            ..PreviewConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_frames_means_one() {
        let config = PreviewConfig {
            max_frames: 0,
            ..PreviewConfig::default()
        };
        assert_eq!(config.frames_to_display(), 1);
    }
}

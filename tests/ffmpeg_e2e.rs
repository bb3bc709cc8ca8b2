//! End-to-end tests against real media files.
//!
//! Clips are generated with FFmpeg's lavfi test sources into a temporary
//! directory. Tests that need FFmpeg skip themselves when `ffmpeg` or
//! `ffprobe` is not installed.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use glyphframe::ascii::{GridGeometry, CURSOR_HOME};
use glyphframe::pipeline::{ErrorKind, Pipeline, PipelineState};
use glyphframe::source::{probe, FfmpegSource, FfmpegTools, SourceError};

fn ffmpeg_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        Command::new(tool)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

/// Run ffmpeg to produce `name` in `dir`; `None` if generation failed.
fn generate(dir: &Path, name: &str, args: &[&str]) -> Option<PathBuf> {
    let path = dir.join(name);
    let status = Command::new("ffmpeg")
        .args(["-v", "error", "-nostdin", "-y"])
        .args(args)
        .arg(&path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .ok()?;
    (status.success() && path.exists()).then_some(path)
}

/// A 64x48 test pattern, three frames long.
fn test_clip(dir: &Path) -> Option<PathBuf> {
    generate(
        dir,
        "clip.mkv",
        &[
            "-f", "lavfi", "-i", "testsrc=size=64x48:rate=5", "-frames:v", "3", "-c:v", "ffv1",
            "-pix_fmt", "yuv420p",
        ],
    )
}

fn tone(dir: &Path) -> Option<PathBuf> {
    generate(
        dir,
        "tone.wav",
        &["-f", "lavfi", "-i", "sine=frequency=440:duration=0.2"],
    )
}

fn preview_binary(input: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_glyphframe"))
        .arg(input)
        .output()
        .expect("failed to run glyphframe")
}

// ==================== Library Tests ====================

#[test]
fn test_clip_reaches_frame_displayed() {
    if !ffmpeg_available() {
        println!("SKIP: ffmpeg/ffprobe not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let Some(clip) = test_clip(dir.path()) else {
        println!("SKIP: could not generate test clip");
        return;
    };

    let tools = FfmpegTools::default();
    let mut pipeline = Pipeline::default();
    let mut out = Vec::new();
    let outcome = pipeline
        .run(|| FfmpegSource::open(&clip, &tools), &mut out)
        .unwrap();

    // 64x48 square pixels: 80 / (4/3 / 0.5) = 30 rows
    assert_eq!(outcome.geometry, GridGeometry { columns: 80, rows: 30 });
    assert_eq!(outcome.frames_displayed, 1);
    assert_eq!(pipeline.state(), PipelineState::FrameDisplayed);

    let text = String::from_utf8(out).unwrap();
    let body = text.strip_prefix(CURSOR_HOME).unwrap();
    assert_eq!(body.lines().count(), 30);
    assert!(body.lines().all(|l| l.chars().count() == 80));
    // The test pattern is not a flat field
    let mut glyphs: Vec<char> = body.chars().filter(|&c| c != '\n').collect();
    glyphs.sort_unstable();
    glyphs.dedup();
    assert!(glyphs.len() >= 2, "flat output: {:?}", glyphs);
}

#[test]
fn test_probe_reports_stream_parameters() {
    if !ffmpeg_available() {
        println!("SKIP: ffmpeg/ffprobe not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let Some(clip) = test_clip(dir.path()) else {
        println!("SKIP: could not generate test clip");
        return;
    };

    let probed = probe("ffprobe", &clip).unwrap();
    assert_eq!((probed.info.width, probed.info.height), (64, 48));
    assert!(probed.info.time_base.is_valid());
}

#[test]
fn test_several_frames_when_configured() {
    if !ffmpeg_available() {
        println!("SKIP: ffmpeg/ffprobe not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let Some(clip) = test_clip(dir.path()) else {
        println!("SKIP: could not generate test clip");
        return;
    };

    let config = glyphframe::config::PreviewConfig {
        max_frames: 10,
        ..Default::default()
    };
    let tools = config.tools();
    let mut pipeline = Pipeline::new(&config).unwrap();
    let mut out = Vec::new();
    let outcome = pipeline
        .run(|| FfmpegSource::open(&clip, &tools), &mut out)
        .unwrap();

    // The clip is shorter than the limit; every frame is shown
    assert_eq!(outcome.frames_displayed, 3);
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches(CURSOR_HOME).count(), 3);
}

#[test]
fn test_audio_only_file_fails_to_open() {
    if !ffmpeg_available() {
        println!("SKIP: ffmpeg/ffprobe not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let Some(wav) = tone(dir.path()) else {
        println!("SKIP: could not generate audio file");
        return;
    };

    let err = FfmpegSource::open(&wav, &FfmpegTools::default()).unwrap_err();
    assert!(matches!(err, SourceError::NoVideoStream(_)));

    let mut pipeline = Pipeline::default();
    let err = pipeline
        .run(|| FfmpegSource::open(&wav, &FfmpegTools::default()), &mut Vec::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceOpen);
    assert_eq!(pipeline.state(), PipelineState::Failed(ErrorKind::SourceOpen));
}

#[test]
fn test_missing_file_fails_to_open() {
    if !ffmpeg_available() {
        println!("SKIP: ffmpeg/ffprobe not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.mp4");

    let mut pipeline = Pipeline::default();
    let err = pipeline
        .run(|| FfmpegSource::open(&missing, &FfmpegTools::default()), &mut Vec::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceOpen);
}

#[test]
fn test_header_only_stream_is_exhausted() {
    if !ffmpeg_available() {
        println!("SKIP: ffmpeg/ffprobe not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let Some(empty) = generate(
        dir.path(),
        "empty.mkv",
        &[
            "-f", "lavfi", "-i", "testsrc=size=64x48:rate=5", "-frames:v", "0", "-c:v", "ffv1",
            "-pix_fmt", "yuv420p",
        ],
    ) else {
        println!("SKIP: could not generate header-only file");
        return;
    };

    let mut pipeline = Pipeline::default();
    let result = pipeline.run(
        || FfmpegSource::open(&empty, &FfmpegTools::default()),
        &mut Vec::new(),
    );
    match result {
        Err(e) if e.kind() == ErrorKind::SourceOpen => {
            println!("SKIP: this FFmpeg build writes no usable stream header: {}", e);
        }
        Err(e) => {
            assert_eq!(e.kind(), ErrorKind::NoFrameAvailable, "{}", e);
            assert_eq!(pipeline.state(), PipelineState::Exhausted);
        }
        Ok(outcome) => panic!("expected no frames, got {:?}", outcome),
    }
}

// ==================== Stub Tool Tests ====================

/// Write an executable shell script standing in for an FFmpeg binary.
#[cfg(unix)]
fn stub_tool(dir: &Path, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

#[cfg(unix)]
#[test]
fn test_corrupt_stream_reports_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let ffprobe = stub_tool(
        dir.path(),
        "ffprobe",
        r#"echo '{"streams":[{"index":0,"width":4,"height":4,"pix_fmt":"gray","sample_aspect_ratio":"1:1","time_base":"1/25","r_frame_rate":"25/1"}]}'"#,
    );
    let ffmpeg = stub_tool(
        dir.path(),
        "ffmpeg",
        "echo 'Error while decoding stream #0:0: Invalid data found when processing input' >&2\nexit 1",
    );
    let tools = FfmpegTools { ffmpeg, ffprobe };
    let clip = dir.path().join("corrupt.mkv");

    let mut pipeline = Pipeline::default();
    let mut out = Vec::new();
    let err = pipeline
        .run(|| FfmpegSource::open(&clip, &tools), &mut out)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decode, "{}", err);
    assert_eq!(pipeline.state(), PipelineState::Failed(ErrorKind::Decode));
    assert!(out.is_empty());
}

#[cfg(unix)]
#[test]
fn test_failed_ffmpeg_without_decode_diagnostic_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let ffprobe = stub_tool(
        dir.path(),
        "ffprobe",
        r#"echo '{"streams":[{"index":0,"width":4,"height":4,"pix_fmt":"gray","time_base":"1/25"}]}'"#,
    );
    let ffmpeg = stub_tool(dir.path(), "ffmpeg", "echo 'pipe:1: Broken pipe' >&2\nexit 1");
    let tools = FfmpegTools { ffmpeg, ffprobe };
    let clip = dir.path().join("clip.mkv");

    let mut pipeline = Pipeline::default();
    let err = pipeline
        .run(|| FfmpegSource::open(&clip, &tools), &mut Vec::new())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SourceRead, "{}", err);
}

// ==================== Binary Tests ====================

#[test]
fn test_binary_without_arguments_exits_one() {
    let output = Command::new(env!("CARGO_BIN_EXE_glyphframe"))
        .output()
        .expect("failed to run glyphframe");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_binary_help_exits_zero() {
    let output = Command::new(env!("CARGO_BIN_EXE_glyphframe"))
        .arg("--help")
        .output()
        .expect("failed to run glyphframe");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_binary_missing_config_exits_one() {
    let output = Command::new(env!("CARGO_BIN_EXE_glyphframe"))
        .args(["--config", "/definitely/not/here.toml", "clip.mp4"])
        .output()
        .expect("failed to run glyphframe");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("here.toml"));
}

#[test]
fn test_binary_displays_clip() {
    if !ffmpeg_available() {
        println!("SKIP: ffmpeg/ffprobe not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let Some(clip) = test_clip(dir.path()) else {
        println!("SKIP: could not generate test clip");
        return;
    };

    let output = preview_binary(&clip);
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.starts_with(CURSOR_HOME.as_bytes()));
    let newlines = output.stdout.iter().filter(|&&b| b == b'\n').count();
    assert_eq!(newlines, 30);
}

#[test]
fn test_binary_reports_kind_for_audio_only_file() {
    if !ffmpeg_available() {
        println!("SKIP: ffmpeg/ffprobe not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let Some(wav) = tone(dir.path()) else {
        println!("SKIP: could not generate audio file");
        return;
    };

    let output = preview_binary(&wav);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error [SourceOpenError]"));
}

//! Media source backed by an `ffmpeg` child process.
//!
//! The input is probed with `ffprobe`, then `ffmpeg` decodes the selected
//! video stream and writes raw frames to its stdout. Reading that pipe
//! yields the units fed to a [`RawVideoDecoder`].

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::probe::probe;
use super::rawvideo::RawVideoDecoder;
use super::{MediaSource, ReadOutcome, SourceError, StreamInfo, Unit};

/// Read size for the raw video pipe.
const READ_CHUNK: usize = 64 * 1024;

/// How long to wait for ffmpeg to exit after an interrupt.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// ffmpeg diagnostics that mean the stream itself could not be decoded.
const DECODE_FAILURE_MARKERS: [&str; 2] = [
    "Error while decoding",
    "Invalid data found when processing input",
];

/// Names or paths of the FFmpeg binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegTools {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

/// A running decode of one input file.
pub struct FfmpegSource {
    path: PathBuf,
    info: StreamInfo,
    child: Child,
    stdout: Option<ChildStdout>,
    /// Collects ffmpeg's stderr until the process exits
    stderr_thread: Option<JoinHandle<Vec<String>>>,
    finished: bool,
}

impl std::fmt::Debug for FfmpegSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSource")
            .field("path", &self.path)
            .field("info", &self.info)
            .field("pid", &self.child.id())
            .finish_non_exhaustive()
    }
}

impl FfmpegSource {
    /// Probe `path`, start decoding its first video stream and return the
    /// source together with a decoder for its units.
    pub fn open(path: &Path, tools: &FfmpegTools) -> Result<(Self, RawVideoDecoder), SourceError> {
        let probed = probe(&tools.ffprobe, path)?;
        let info = probed.info;
        log::debug!(
            "stream #{}: {}x{} {} (decoding as {}), sar {}, time base {}",
            info.index,
            info.width,
            info.height,
            probed.native_format,
            info.format,
            info.sar,
            info.time_base
        );

        let args = decode_args(path, &info);
        log::debug!("spawning {} {:?}", tools.ffmpeg, args);

        let mut child = Command::new(&tools.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SourceError::ToolNotFound {
                        tool: tools.ffmpeg.clone(),
                    }
                } else {
                    SourceError::Open {
                        path: path.to_path_buf(),
                        reason: format!("failed to spawn {}: {}", tools.ffmpeg, e),
                    }
                }
            })?;

        let stdout = child.stdout.take();
        let stderr_thread = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                let reader = BufReader::new(stderr);
                let mut lines = Vec::new();
                for line in reader.lines() {
                    match line {
                        Ok(l) => {
                            log::debug!("[ffmpeg] {}", l);
                            lines.push(l);
                        }
                        Err(_) => break,
                    }
                }
                lines
            })
        });

        let decoder = RawVideoDecoder::new(&info);
        let source = Self {
            path: path.to_path_buf(),
            info,
            child,
            stdout,
            stderr_thread,
            finished: false,
        };
        Ok((source, decoder))
    }

    /// Stderr lines collected so far. Joins the reader thread, so only call
    /// this once the process has exited.
    fn take_stderr_output(&mut self) -> Vec<String> {
        self.stderr_thread
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default()
    }

    fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Stop ffmpeg: close the pipe, interrupt it, and kill it if it does not
    /// exit in time.
    fn shutdown(&mut self) {
        // A closed pipe alone usually ends ffmpeg with EPIPE
        self.stdout = None;

        #[cfg(unix)]
        {
            // SAFETY: the pid belongs to our own child, which has not been reaped yet
            unsafe {
                libc::kill(self.child.id() as i32, libc::SIGINT);
            }
        }
        #[cfg(not(unix))]
        {
            let _ = self.child.kill();
        }

        let start = Instant::now();
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if start.elapsed() > SHUTDOWN_TIMEOUT => {
                    let _ = self.child.kill();
                    let _ = self.child.wait();
                    break;
                }
                Ok(None) => thread::sleep(Duration::from_millis(20)),
                Err(e) => {
                    log::warn!("failed to wait for ffmpeg: {}", e);
                    break;
                }
            }
        }
    }

    /// The pipe hit EOF: decide between a clean end and a failure.
    fn finish(&mut self) -> Result<ReadOutcome, SourceError> {
        self.finished = true;
        self.stdout = None;
        let status = self.child.wait()?;
        let stderr = self.take_stderr_output();
        if status.success() {
            return Ok(ReadOutcome::EndOfStream);
        }

        let detail = stderr.join("\n");
        let message = match status.code() {
            Some(code) if detail.is_empty() => format!("ffmpeg exited with code {}", code),
            Some(code) => format!("ffmpeg exited with code {}: {}", code, detail),
            None => format!("ffmpeg terminated by signal: {}", detail),
        };
        if is_decode_failure(&stderr) {
            Err(SourceError::Decode(message))
        } else {
            Err(SourceError::Read(message))
        }
    }
}

impl MediaSource for FfmpegSource {
    fn stream_info(&self) -> &StreamInfo {
        &self.info
    }

    fn read_unit(&mut self) -> Result<ReadOutcome, SourceError> {
        if self.finished {
            return Ok(ReadOutcome::EndOfStream);
        }
        let Some(stdout) = self.stdout.as_mut() else {
            return self.finish();
        };

        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            match stdout.read(&mut buf) {
                Ok(0) => return self.finish(),
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(ReadOutcome::Unit(Unit {
                        stream_index: self.info.index,
                        data: buf,
                    }));
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SourceError::Read(e.to_string())),
            }
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        if self.is_running() {
            self.shutdown();
        }
        // Reap the stderr reader either way
        let _ = self.take_stderr_output();
    }
}

/// True when ffmpeg's stderr reports corrupt stream data rather than an
/// I/O or setup problem.
fn is_decode_failure(stderr: &[String]) -> bool {
    stderr
        .iter()
        .any(|line| DECODE_FAILURE_MARKERS.iter().any(|m| line.contains(m)))
}

/// ffmpeg arguments that decode stream `info.index` of `path` to raw video.
fn decode_args(path: &Path, info: &StreamInfo) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-nostdin".to_string(),
        // Stop at the first decode error instead of concealing it
        "-xerror".to_string(),
        // Frame geometry must match the probed stream
        "-noautorotate".to_string(),
        "-i".to_string(),
        path.to_string_lossy().into_owned(),
        "-map".to_string(),
        format!("0:{}", info.index),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        info.format.name().to_string(),
        "pipe:1".to_string(),
    ]
}

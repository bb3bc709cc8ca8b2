//! Decoder for headerless raw video, as produced by `ffmpeg -f rawvideo`.

use super::{Decoded, Decoder, SourceError, StreamInfo, Unit};
use crate::frame::{Frame, PixelFormat, Rational};

/// Reassembles arbitrarily sized units into whole frames.
#[derive(Debug)]
pub struct RawVideoDecoder {
    width: u32,
    height: u32,
    format: PixelFormat,
    sar: Rational,
    time_base: Rational,
    frame_rate: Option<Rational>,
    frame_size: usize,
    pending: Vec<u8>,
    frames_decoded: i64,
    eof: bool,
}

impl RawVideoDecoder {
    pub fn new(info: &StreamInfo) -> Self {
        let frame_size = info.format.frame_size(info.width, info.height);
        Self {
            width: info.width,
            height: info.height,
            format: info.format,
            sar: info.sar,
            time_base: info.time_base,
            frame_rate: info.frame_rate,
            frame_size,
            pending: Vec::with_capacity(frame_size),
            frames_decoded: 0,
            eof: false,
        }
    }

    /// Byte size of one frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Timestamp of frame `n` in stream time-base units.
    ///
    /// Raw video carries no timestamps, so they are derived from the frame
    /// rate. Without a frame rate the frame number is used.
    fn timestamp(&self, n: i64) -> i64 {
        match self.frame_rate {
            Some(rate) if rate.is_valid() && self.time_base.is_valid() => {
                let num = n as f64 * rate.den as f64 * self.time_base.den as f64;
                let den = rate.num as f64 * self.time_base.num as f64;
                (num / den).round() as i64
            }
            _ => n,
        }
    }
}

impl Decoder for RawVideoDecoder {
    fn send(&mut self, unit: Unit) -> Result<(), SourceError> {
        if self.eof {
            return Err(SourceError::Decode(
                "unit received after end of stream".to_string(),
            ));
        }
        self.pending.extend_from_slice(&unit.data);
        Ok(())
    }

    fn send_eof(&mut self) {
        self.eof = true;
    }

    fn receive(&mut self) -> Result<Decoded, SourceError> {
        if self.pending.len() < self.frame_size {
            if !self.eof {
                return Ok(Decoded::NeedsInput);
            }
            if !self.pending.is_empty() {
                log::warn!(
                    "Discarding {} trailing bytes (less than one {} byte frame)",
                    self.pending.len(),
                    self.frame_size
                );
                self.pending.clear();
            }
            return Ok(Decoded::EndOfStream);
        }

        let data: Vec<u8> = self.pending.drain(..self.frame_size).collect();
        let mut frame = Frame::from_packed(self.width, self.height, self.format, data)
            .ok_or_else(|| {
                SourceError::Decode(format!(
                    "cannot build {}x{} {} frame",
                    self.width, self.height, self.format
                ))
            })?;
        frame.sar = self.sar;

        let best_effort_timestamp = Some(self.timestamp(self.frames_decoded));
        self.frames_decoded += 1;

        Ok(Decoded::Frame {
            frame,
            best_effort_timestamp,
        })
    }
}

//! Synthetic sources for tests

use crate::error::{AudioError, Result};
use crate::streamer::{Frame, StreamSeeker, Streamer};
use std::f32::consts::TAU;

/// Seekable stereo sine wave of a fixed length
///
/// Frame `i` is `sin(2π·440·i/rate)` at half amplitude, so any frame can be
/// recomputed from its index.
#[derive(Debug)]
pub struct SineSource {
    sample_rate: u32,
    len: usize,
    position: usize,
    fail_at: Option<usize>,
    fail_seeks: bool,
    error: Option<AudioError>,
}

impl SineSource {
    /// Sine of `len` frames at `sample_rate`
    pub fn new(sample_rate: u32, len: usize) -> Self {
        Self {
            sample_rate,
            len,
            position: 0,
            fail_at: None,
            fail_seeks: false,
            error: None,
        }
    }

    /// Sine lasting `seconds`
    pub fn with_duration(sample_rate: u32, seconds: f64) -> Self {
        Self::new(sample_rate, (seconds * sample_rate as f64) as usize)
    }

    /// End the stream with a decode error once `position` is reached
    #[must_use]
    pub fn fail_at(mut self, position: usize) -> Self {
        self.fail_at = Some(position);
        self
    }

    /// Make every seek fail
    #[must_use]
    pub fn fail_seeks(mut self) -> Self {
        self.fail_seeks = true;
        self
    }

    /// Sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Expected value of frame `index`
    pub fn frame_at(sample_rate: u32, index: usize) -> Frame {
        let t = index as f32 / sample_rate as f32;
        let s = 0.5 * (TAU * 440.0 * t).sin();
        [s, s]
    }
}

impl Streamer for SineSource {
    fn stream(&mut self, frames: &mut [Frame]) -> (usize, bool) {
        if self.error.is_some() {
            return (0, false);
        }

        let end = self.fail_at.map_or(self.len, |f| f.min(self.len));
        let n = frames.len().min(end.saturating_sub(self.position));
        for (i, frame) in frames[..n].iter_mut().enumerate() {
            *frame = Self::frame_at(self.sample_rate, self.position + i);
        }
        self.position += n;

        if self.fail_at.is_some_and(|f| self.position >= f) {
            self.error = Some(AudioError::DecodeError("synthetic failure".to_string()));
            return (n, false);
        }
        (n, self.position < self.len)
    }

    fn err(&self) -> Option<&AudioError> {
        self.error.as_ref()
    }
}

impl StreamSeeker for SineSource {
    fn len(&self) -> usize {
        self.len
    }

    fn position(&self) -> usize {
        self.position
    }

    fn seek(&mut self, position: usize) -> Result<()> {
        if self.fail_seeks {
            return Err(AudioError::SeekError("synthetic seek failure".to_string()));
        }
        if position > self.len {
            return Err(AudioError::SeekOutOfRange {
                position,
                len: self.len,
            });
        }
        self.position = position;
        Ok(())
    }
}

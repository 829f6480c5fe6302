//! Pause gate

use crate::error::AudioError;
use crate::streamer::{Frame, Streamer, SILENCE};

/// Zero-fills while paused and keeps the device fed
pub struct Ctrl<S> {
    source: S,
    paused: bool,
}

impl<S: Streamer> Ctrl<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            paused: false,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn inner(&self) -> &S {
        &self.source
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: Streamer> Streamer for Ctrl<S> {
    fn stream(&mut self, frames: &mut [Frame]) -> (usize, bool) {
        if self.paused {
            frames.fill(SILENCE);
            return (frames.len(), true);
        }
        self.source.stream(frames)
    }

    fn err(&self) -> Option<&AudioError> {
        self.source.err()
    }
}

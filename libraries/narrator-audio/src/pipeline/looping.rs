//! Loop stage: rewinds the source when it ends

use crate::error::AudioError;
use crate::streamer::{Frame, StreamSeeker, Streamer};

/// Replays a seekable source `count` times
///
/// - `count < 0`: loop forever
/// - `count == 0`: produce nothing
/// - `count > 0`: play the source `count` times
///
/// A source error or a failed rewind ends the loop.
pub struct Loop<S> {
    source: S,
    remaining: i64,
    error: Option<AudioError>,
}

impl<S: StreamSeeker> Loop<S> {
    pub fn new(count: i64, source: S) -> Self {
        Self {
            source,
            remaining: count,
            error: None,
        }
    }

    /// Passes left, negative when unbounded
    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    pub fn inner(&self) -> &S {
        &self.source
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn finish(&mut self) {
        self.remaining = 0;
    }
}

impl<S: StreamSeeker> Streamer for Loop<S> {
    fn stream(&mut self, frames: &mut [Frame]) -> (usize, bool) {
        if self.remaining == 0 {
            return (0, false);
        }

        let mut filled = 0;
        // Set right after a rewind; cleared once the new pass yields frames
        let mut rewound = false;

        while filled < frames.len() {
            let (n, more) = self.source.stream(&mut frames[filled..]);
            filled += n;
            if n > 0 {
                rewound = false;
            }

            if more {
                if n == 0 {
                    break;
                }
                continue;
            }

            if self.source.err().is_some() {
                self.finish();
                return (filled, false);
            }

            if self.remaining > 0 {
                self.remaining -= 1;
            }
            // An empty pass straight after a rewind would spin forever
            if self.remaining == 0 || rewound {
                self.finish();
                return (filled, false);
            }

            if let Err(e) = self.source.seek(0) {
                tracing::warn!("Loop rewind failed: {}", e);
                self.error = Some(e);
                self.finish();
                return (filled, false);
            }
            rewound = true;
        }

        (filled, true)
    }

    fn err(&self) -> Option<&AudioError> {
        self.error.as_ref().or_else(|| self.source.err())
    }
}

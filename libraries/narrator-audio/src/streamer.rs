//! Pull-based stream contract shared by every pipeline stage

use crate::error::{AudioError, Result};

/// One stereo sample: left and right channel
pub type Frame = [f32; 2];

/// Silent frame
pub const SILENCE: Frame = [0.0, 0.0];

/// A source of stereo frames pulled by the stage above it
pub trait Streamer: Send {
    /// Fill `frames` from the start
    ///
    /// # Returns
    /// `(n, more)` where `n` is the number of frames written and `more` is
    /// `false` once the stream is drained. A stream that reports
    /// `more == false` must not be pulled again.
    fn stream(&mut self, frames: &mut [Frame]) -> (usize, bool);

    /// Error that ended the stream, if any
    fn err(&self) -> Option<&AudioError> {
        None
    }
}

/// A stream with a known length that can be repositioned
pub trait StreamSeeker: Streamer {
    /// Total number of frames
    fn len(&self) -> usize;

    /// Index of the next frame to be streamed
    fn position(&self) -> usize;

    /// Move the play head to `position`
    ///
    /// # Errors
    /// Returns `AudioError::SeekOutOfRange` when `position > len()`
    fn seek(&mut self, position: usize) -> Result<()>;
}

impl<S: Streamer + ?Sized> Streamer for Box<S> {
    fn stream(&mut self, frames: &mut [Frame]) -> (usize, bool) {
        (**self).stream(frames)
    }

    fn err(&self) -> Option<&AudioError> {
        (**self).err()
    }
}

impl<S: StreamSeeker + ?Sized> StreamSeeker for Box<S> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn position(&self) -> usize {
        (**self).position()
    }

    fn seek(&mut self, position: usize) -> Result<()> {
        (**self).seek(position)
    }
}

/// Fill `frames` by pulling repeatedly until full or drained
///
/// Stages that need an exact input count use this instead of a single pull,
/// since sources may return short reads.
pub fn fill<S: Streamer + ?Sized>(source: &mut S, frames: &mut [Frame]) -> (usize, bool) {
    let mut filled = 0;
    while filled < frames.len() {
        let (n, more) = source.stream(&mut frames[filled..]);
        filled += n;
        if !more {
            return (filled, false);
        }
        if n == 0 {
            // A source that neither produces nor ends would spin forever
            break;
        }
    }
    (filled, true)
}

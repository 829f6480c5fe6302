//! Position-tracking decorator
//!
//! Wraps a seekable source and mirrors its play head into an atomic counter
//! so the UI can read position and length without touching the output lock.

use crate::error::{AudioError, Result};
use crate::streamer::{Frame, StreamSeeker, Streamer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Seekable source that records its position by delta
pub struct Tracked<S> {
    source: S,
    len: usize,
    position: Arc<AtomicUsize>,
}

/// Lock-free view of a [`Tracked`] stream
///
/// Reads may lag the audio thread by one buffer fill.
#[derive(Debug, Clone)]
pub struct TrackedHandle {
    position: Arc<AtomicUsize>,
    len: usize,
}

impl<S: StreamSeeker> Tracked<S> {
    /// Wrap `source`, capturing its length and current position
    pub fn new(source: S) -> Self {
        let len = source.len();
        let position = Arc::new(AtomicUsize::new(source.position()));
        Self {
            source,
            len,
            position,
        }
    }

    /// Handle for readers on other threads
    pub fn handle(&self) -> TrackedHandle {
        TrackedHandle {
            position: Arc::clone(&self.position),
            len: self.len,
        }
    }
}

impl TrackedHandle {
    /// Current play head in frames
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Relaxed)
    }

    /// Length captured when the stream was wrapped
    pub fn len(&self) -> usize {
        self.len
    }
}

impl<S: StreamSeeker> Streamer for Tracked<S> {
    fn stream(&mut self, frames: &mut [Frame]) -> (usize, bool) {
        let (n, more) = self.source.stream(frames);
        self.position.fetch_add(n, Ordering::Relaxed);
        (n, more)
    }

    fn err(&self) -> Option<&AudioError> {
        self.source.err()
    }
}

impl<S: StreamSeeker> StreamSeeker for Tracked<S> {
    fn len(&self) -> usize {
        self.len
    }

    fn position(&self) -> usize {
        self.position.load(Ordering::Relaxed)
    }

    fn seek(&mut self, position: usize) -> Result<()> {
        self.source.seek(position)?;
        self.position.store(position, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::SineSource;

    #[test]
    fn test_position_advances_by_delta() {
        let mut tracked = Tracked::new(SineSource::new(44100, 1000));
        let handle = tracked.handle();
        let mut buf = vec![[0.0; 2]; 300];

        tracked.stream(&mut buf);
        tracked.stream(&mut buf);

        assert_eq!(handle.position(), 600);
        assert_eq!(handle.len(), 1000);
    }

    #[test]
    fn test_seek_replaces_position() {
        let mut tracked = Tracked::new(SineSource::new(44100, 1000));
        let handle = tracked.handle();
        let mut buf = vec![[0.0; 2]; 100];
        tracked.stream(&mut buf);

        tracked.seek(250).unwrap();
        assert_eq!(handle.position(), 250);
        assert_eq!(tracked.position(), 250);
    }

    #[test]
    fn test_failed_seek_keeps_position() {
        let mut tracked = Tracked::new(SineSource::new(44100, 1000));
        let mut buf = vec![[0.0; 2]; 100];
        tracked.stream(&mut buf);

        assert!(tracked.seek(5000).is_err());
        assert_eq!(tracked.position(), 100);
    }

    #[test]
    fn test_short_read_at_end() {
        let mut tracked = Tracked::new(SineSource::new(44100, 150));
        let mut buf = vec![[0.0; 2]; 100];

        assert_eq!(tracked.stream(&mut buf), (100, true));
        assert_eq!(tracked.stream(&mut buf), (50, false));
        assert_eq!(tracked.position(), 150);
    }
}

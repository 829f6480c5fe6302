//! Playback pipeline
//!
//! ```text
//! Tracked -> Loop(-1) -> Ctrl -> Resample -> Volume -> Speaker
//! ```
//!
//! The whole chain sits behind one mutex shared with the speaker's pull
//! thread. Every mutator takes that lock for a single field write or seek,
//! so the next buffer fill observes the change.

mod ctrl;
mod looping;
mod resample;
mod volume;

pub use ctrl::Ctrl;
pub use looping::Loop;
pub use resample::Resample;
pub use volume::Volume;

use crate::error::{AudioError, Result};
use crate::output::{SharedSource, SpeakerHandle};
use crate::streamer::{Frame, StreamSeeker, Streamer};
use crate::tracked::{Tracked, TrackedHandle};
use parking_lot::Mutex;
use std::sync::Arc;

/// Base of the volume exponent
pub const VOLUME_BASE: f64 = 2.0;

/// Decoded source type carried by the pipeline
pub type Source = Box<dyn StreamSeeker>;

/// The full stage chain, head first
pub type Chain = Volume<Resample<Ctrl<Loop<Tracked<Source>>>>>;

fn ctrl_mut(chain: &mut Chain) -> &mut Ctrl<Loop<Tracked<Source>>> {
    chain.inner_mut().inner_mut()
}

fn ctrl(chain: &Chain) -> &Ctrl<Loop<Tracked<Source>>> {
    chain.inner().inner()
}

fn tracked_mut(chain: &mut Chain) -> &mut Tracked<Source> {
    ctrl_mut(chain).inner_mut().inner_mut()
}

/// Clamp a (possibly negative or oversized) target to `[0, len - 1]`
///
/// `len` must be non-zero.
pub fn clamp_position(target: f64, len: usize) -> usize {
    let last = len.saturating_sub(1);
    if target.is_nan() || target <= 0.0 {
        0
    } else if target >= last as f64 {
        last
    } else {
        target as usize
    }
}

/// One file's playback chain and its registration with the speaker
pub struct AudioPipeline {
    chain: Arc<Mutex<Chain>>,
    tracker: TrackedHandle,
    sample_rate: u32,
    speaker: SpeakerHandle,
    started: bool,
}

impl AudioPipeline {
    /// Build the chain over `source` at unity speed and volume
    ///
    /// # Arguments
    /// * `source` - Decoded stream
    /// * `sample_rate` - Native rate of `source`
    /// * `speaker` - Handle from the `Speaker::init` call for this file
    pub fn new(source: Source, sample_rate: u32, speaker: SpeakerHandle) -> Result<Self> {
        let tracked = Tracked::new(source);
        let tracker = tracked.handle();
        let gate = Ctrl::new(Loop::new(-1, tracked));
        let chain = Volume::new(VOLUME_BASE, 0.0, Resample::new(1.0, gate)?);

        Ok(Self {
            chain: Arc::new(Mutex::new(chain)),
            tracker,
            sample_rate,
            speaker,
            started: false,
        })
    }

    /// Start or continue playback
    ///
    /// The first call registers the chain with the speaker; later calls
    /// only open the gate.
    pub fn play(&mut self) {
        ctrl_mut(&mut self.chain.lock()).set_paused(false);
        if !self.started {
            let source: SharedSource = self.chain.clone();
            self.started = self.speaker.play(source);
        }
    }

    /// Close the gate; the device keeps running on silence
    pub fn pause(&self) {
        let mut chain = self.chain.lock();
        ctrl_mut(&mut chain).set_paused(true);
        chain.inner_mut().flush();
    }

    /// Reopen the gate without touching speaker registration
    pub fn resume(&self) {
        ctrl_mut(&mut self.chain.lock()).set_paused(false);
    }

    /// Add `delta` to the volume level
    pub fn set_volume(&self, delta: f64) {
        let mut chain = self.chain.lock();
        let level = chain.level() + delta;
        chain.set_level(level);
    }

    /// Install a new speed ratio (replaces, does not multiply)
    pub fn set_speed(&self, ratio: f64) -> Result<()> {
        self.chain.lock().inner_mut().set_ratio(ratio)
    }

    /// Move the play head by `seconds`, clamped to the stream
    ///
    /// Seek failures are logged and otherwise ignored; the position may
    /// then be stale.
    pub fn skip(&self, seconds: f64) {
        let mut chain = self.chain.lock();
        let tracked = tracked_mut(&mut chain);
        let len = tracked.len();
        if len == 0 {
            return;
        }

        let target = tracked.position() as f64 + seconds * f64::from(self.sample_rate);
        let position = clamp_position(target, len);
        match tracked.seek(position) {
            Ok(()) => chain.inner_mut().flush(),
            Err(e) => tracing::warn!(position, "Skip seek failed: {}", e),
        }
    }

    /// Seek to an absolute frame, clamped to `[0, len - 1]`
    ///
    /// # Returns
    /// The frame actually sought to
    pub fn seek(&self, position: usize) -> Result<usize> {
        let mut chain = self.chain.lock();
        let tracked = tracked_mut(&mut chain);
        let len = tracked.len();
        if len == 0 {
            return Err(AudioError::EmptyStream);
        }

        let clamped = position.min(len - 1);
        tracked.seek(clamped)?;
        chain.inner_mut().flush();
        Ok(clamped)
    }

    /// Stop the speaker from pulling this chain
    pub fn detach(&mut self) {
        if self.started {
            self.speaker.stop();
            self.started = false;
        }
    }

    /// Pull frames directly, bypassing the speaker
    pub fn pull(&self, frames: &mut [Frame]) -> (usize, bool) {
        self.chain.lock().stream(frames)
    }

    pub fn speed(&self) -> f64 {
        self.chain.lock().inner().ratio()
    }

    pub fn volume(&self) -> f64 {
        self.chain.lock().level()
    }

    pub fn is_paused(&self) -> bool {
        ctrl(&self.chain.lock()).is_paused()
    }

    /// Whether the chain is registered with the speaker
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the speaker has not been re-initialised since this pipeline
    /// was built
    pub fn is_output_current(&self) -> bool {
        self.speaker.is_current()
    }

    /// Current frame, read without the lock
    pub fn position(&self) -> usize {
        self.tracker.position()
    }

    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Lock-free position reader for other threads
    pub fn tracker(&self) -> TrackedHandle {
        self.tracker.clone()
    }
}

impl Drop for AudioPipeline {
    fn drop(&mut self) {
        self.detach();
    }
}

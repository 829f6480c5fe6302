//! In-memory output for tests
//!
//! The speaker writes into a rendezvous channel, so it blocks after every
//! buffer until the test takes it. This makes elapsed playback time a
//! function of buffers received rather than wall clock.

use super::OutputDevice;
use crate::error::Result;
use crate::streamer::Frame;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct MemoryState {
    rx: Option<Receiver<Vec<Frame>>>,
    sample_rate: u32,
    buffer_frames: usize,
    opens: usize,
}

/// Device half, handed to the `Speaker`
pub struct MemoryDevice {
    state: Arc<Mutex<MemoryState>>,
}

/// Test half, receives what the speaker plays
#[derive(Clone)]
pub struct MemoryOutput {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDevice {
    /// Create a connected device/output pair
    pub fn new() -> (Self, MemoryOutput) {
        let state = Arc::new(Mutex::new(MemoryState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MemoryOutput { state },
        )
    }
}

impl OutputDevice for MemoryDevice {
    fn open(&mut self, sample_rate: u32, buffer_frames: usize) -> Result<Sender<Vec<Frame>>> {
        let (tx, rx) = crossbeam_channel::bounded(0);
        let mut state = self.state.lock();
        state.rx = Some(rx);
        state.sample_rate = sample_rate;
        state.buffer_frames = buffer_frames;
        state.opens += 1;
        Ok(tx)
    }

    fn close(&mut self) {
        self.state.lock().rx = None;
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

impl MemoryOutput {
    /// Take the next buffer the speaker plays
    pub fn recv(&self, timeout: Duration) -> Option<Vec<Frame>> {
        let rx = self.state.lock().rx.clone()?;
        rx.recv_timeout(timeout).ok()
    }

    /// Take `count` buffers, failing fast if the speaker stalls
    pub fn recv_many(&self, count: usize, timeout: Duration) -> Option<Vec<Vec<Frame>>> {
        (0..count).map(|_| self.recv(timeout)).collect()
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().rx.is_some()
    }

    pub fn sample_rate(&self) -> u32 {
        self.state.lock().sample_rate
    }

    pub fn buffer_frames(&self) -> usize {
        self.state.lock().buffer_frames
    }

    /// Number of times the device was opened
    pub fn opens(&self) -> usize {
        self.state.lock().opens
    }
}

//! Output driver
//!
//! A [`Speaker`] owns one [`OutputDevice`] and a pull thread. Each opened
//! file calls [`Speaker::init`] with its sample rate, which tears down the
//! previous thread and hands back a [`SpeakerHandle`] tied to that init.
//! Pipelines register themselves through the handle; a handle from an older
//! init can no longer register, so a replaced session is never pulled again.

#[cfg(feature = "desktop")]
mod cpal;
#[cfg(any(test, feature = "test-utils"))]
mod memory;
mod null;

#[cfg(feature = "desktop")]
pub use self::cpal::CpalDevice;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::{MemoryDevice, MemoryOutput};
pub use null::NullDevice;

use crate::error::{AudioError, Result};
use crate::streamer::{Frame, Streamer, SILENCE};
use crossbeam_channel::{select, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A stream the speaker can pull, shared with its owner
pub type SharedSource = Arc<Mutex<dyn Streamer>>;

/// Sink for buffers produced by the speaker's pull thread
pub trait OutputDevice: Send {
    /// Start the device at `sample_rate`
    ///
    /// # Returns
    /// The sender the pull thread writes buffers of `buffer_frames` to.
    /// Sending blocks while the device is full.
    fn open(&mut self, sample_rate: u32, buffer_frames: usize) -> Result<Sender<Vec<Frame>>>;

    /// Stop the device; safe to call when not open
    fn close(&mut self);

    /// Human-readable backend name for logs
    fn name(&self) -> &'static str;
}

/// Registration slot shared by the speaker and its handles
struct Slot {
    epoch: u64,
    source: Option<SharedSource>,
}

/// Pull thread control
struct Worker {
    /// Dropped to stop the thread
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

/// Output driver owning a device and its pull thread
pub struct Speaker {
    device: Box<dyn OutputDevice>,
    slot: Arc<Mutex<Slot>>,
    worker: Option<Worker>,
    epoch: u64,
    sample_rate: u32,
}

impl Speaker {
    pub fn new(device: Box<dyn OutputDevice>) -> Self {
        Self {
            device,
            slot: Arc::new(Mutex::new(Slot {
                epoch: 0,
                source: None,
            })),
            worker: None,
            epoch: 0,
            sample_rate: 0,
        }
    }

    /// (Re)start output at `sample_rate` with buffers of `buffer_frames`
    ///
    /// Any previously registered source is dropped and will not be pulled
    /// again.
    pub fn init(&mut self, sample_rate: u32, buffer_frames: usize) -> Result<SpeakerHandle> {
        if sample_rate == 0 || buffer_frames == 0 {
            return Err(AudioError::DeviceError(format!(
                "Invalid output configuration: {} Hz, {} frames",
                sample_rate, buffer_frames
            )));
        }

        self.shutdown();
        self.epoch += 1;
        {
            let mut slot = self.slot.lock();
            slot.epoch = self.epoch;
            slot.source = None;
        }

        let tx = self.device.open(sample_rate, buffer_frames)?;
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let slot = Arc::clone(&self.slot);
        let thread = thread::Builder::new()
            .name("narrator-speaker".to_string())
            .spawn(move || pull_loop(&slot, buffer_frames, &tx, &stop_rx))?;

        self.worker = Some(Worker {
            stop: stop_tx,
            thread,
        });
        self.sample_rate = sample_rate;

        tracing::info!(
            sample_rate,
            buffer_frames,
            device = self.device.name(),
            "Speaker initialised"
        );

        Ok(SpeakerHandle {
            epoch: self.epoch,
            slot: Arc::clone(&self.slot),
        })
    }

    /// Stop the pull thread and release the device
    pub fn close(&mut self) {
        if self.worker.is_none() {
            return;
        }
        self.shutdown();
        // Invalidate outstanding handles
        self.epoch += 1;
        self.slot.lock().epoch = self.epoch;
        tracing::info!(device = self.device.name(), "Speaker closed");
    }

    /// Whether a pull thread is running
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Rate of the last successful init
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            drop(worker.stop);
            if worker.thread.join().is_err() {
                tracing::error!("Speaker thread panicked");
            }
        }
        self.slot.lock().source = None;
        self.device.close();
    }
}

impl Drop for Speaker {
    fn drop(&mut self) {
        self.close();
    }
}

/// Registration rights for one `Speaker::init`
#[derive(Clone)]
pub struct SpeakerHandle {
    epoch: u64,
    slot: Arc<Mutex<Slot>>,
}

impl SpeakerHandle {
    /// Handle bound to no speaker; `play` always refuses
    pub fn detached() -> Self {
        Self {
            epoch: 0,
            slot: Arc::new(Mutex::new(Slot {
                epoch: u64::MAX,
                source: None,
            })),
        }
    }

    /// Register `source` as the one being pulled
    ///
    /// # Returns
    /// `false` if the speaker has been re-initialised or closed since this
    /// handle was issued
    pub fn play(&self, source: SharedSource) -> bool {
        let mut slot = self.slot.lock();
        if slot.epoch != self.epoch {
            tracing::debug!(
                handle = self.epoch,
                current = slot.epoch,
                "Ignoring play from stale speaker handle"
            );
            return false;
        }
        slot.source = Some(source);
        true
    }

    /// Unregister the current source, if this handle is still current
    pub fn stop(&self) {
        let mut slot = self.slot.lock();
        if slot.epoch == self.epoch {
            slot.source = None;
        }
    }

    /// Whether this handle can still register a source
    pub fn is_current(&self) -> bool {
        self.slot.lock().epoch == self.epoch
    }

    /// Whether a source is registered under this handle
    pub fn is_playing(&self) -> bool {
        let slot = self.slot.lock();
        slot.epoch == self.epoch && slot.source.is_some()
    }
}

/// Body of the `narrator-speaker` thread
///
/// Each iteration holds the source lock only for one buffer fill; the send
/// to the device happens after it is released.
fn pull_loop(
    slot: &Mutex<Slot>,
    buffer_frames: usize,
    tx: &Sender<Vec<Frame>>,
    stop: &Receiver<()>,
) {
    loop {
        let mut buffer = vec![SILENCE; buffer_frames];

        let source = slot.lock().source.clone();
        if let Some(source) = source {
            let (_, more) = source.lock().stream(&mut buffer);
            if !more {
                tracing::debug!("Source drained; unregistering");
                let mut slot = slot.lock();
                if slot
                    .source
                    .as_ref()
                    .is_some_and(|current| Arc::ptr_eq(current, &source))
                {
                    slot.source = None;
                }
            }
        }

        select! {
            send(tx, buffer) -> res => {
                if res.is_err() {
                    tracing::debug!("Output device disconnected");
                    break;
                }
            }
            recv(stop) -> _ => break,
        }
    }
}

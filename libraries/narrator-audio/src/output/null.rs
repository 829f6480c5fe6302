//! Output that discards audio at the nominal rate

use super::OutputDevice;
use crate::error::Result;
use crate::streamer::Frame;
use crossbeam_channel::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Consumes buffers in real time without producing sound
///
/// Used when no audio device is available so position still advances.
#[derive(Default)]
pub struct NullDevice {
    consumer: Option<JoinHandle<()>>,
}

impl NullDevice {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputDevice for NullDevice {
    fn open(&mut self, sample_rate: u32, buffer_frames: usize) -> Result<Sender<Vec<Frame>>> {
        self.close();

        let period = Duration::from_secs_f64(buffer_frames as f64 / f64::from(sample_rate.max(1)));
        let (tx, rx) = crossbeam_channel::bounded::<Vec<Frame>>(1);
        let consumer = thread::Builder::new()
            .name("narrator-null-output".to_string())
            .spawn(move || {
                // Ends once the speaker drops its sender
                while rx.recv().is_ok() {
                    thread::sleep(period);
                }
            })?;

        self.consumer = Some(consumer);
        Ok(tx)
    }

    fn close(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            if consumer.join().is_err() {
                tracing::error!("Null output thread panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

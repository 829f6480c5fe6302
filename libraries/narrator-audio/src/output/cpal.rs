/// CPAL-based output device
use super::OutputDevice;
use crate::error::{AudioError, Result};
use crate::streamer::Frame;
use ::cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ::cpal::{BufferSize, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Buffers queued between the pull thread and the device callback
const QUEUE_DEPTH: usize = 2;

/// Default system output device
///
/// **Architecture**: the CPAL `Stream` is not `Send`, so it is built and
/// owned by a dedicated thread that lives until `close`. The device
/// callback drains buffers from the speaker's channel and plays silence on
/// underrun.
#[derive(Default)]
pub struct CpalDevice {
    /// Dropped to release the stream thread
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream thread main: build, report readiness, park until shutdown
    fn stream_thread_run(
        sample_rate: u32,
        buffers: Receiver<Vec<Frame>>,
        ready: Sender<Result<()>>,
        shutdown: Receiver<()>,
    ) {
        let stream = match Self::build_stream(sample_rate, buffers) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        let _ = ready.send(Ok(()));

        // Disconnect is the only message
        let _ = shutdown.recv();
        drop(stream);
    }

    fn build_stream(sample_rate: u32, buffers: Receiver<Vec<Frame>>) -> Result<Stream> {
        let host = ::cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::DeviceNotFound)?;

        let config = StreamConfig {
            channels: 2,
            sample_rate,
            buffer_size: BufferSize::Default,
        };

        let mut current: Vec<Frame> = Vec::new();
        let mut offset = 0;
        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &::cpal::OutputCallbackInfo| {
                for out in data.chunks_exact_mut(2) {
                    if offset >= current.len() {
                        match buffers.try_recv() {
                            Ok(next) if !next.is_empty() => {
                                current = next;
                                offset = 0;
                            }
                            _ => {
                                out.fill(0.0);
                                continue;
                            }
                        }
                    }
                    out.copy_from_slice(&current[offset]);
                    offset += 1;
                }
            },
            |err| tracing::error!("Audio stream error: {}", err),
            None,
        )?;
        stream.play()?;

        Ok(stream)
    }
}

impl OutputDevice for CpalDevice {
    fn open(&mut self, sample_rate: u32, _buffer_frames: usize) -> Result<Sender<Vec<Frame>>> {
        self.close();

        let (tx, rx) = bounded::<Vec<Frame>>(QUEUE_DEPTH);
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let thread = thread::Builder::new()
            .name("narrator-cpal".to_string())
            .spawn(move || Self::stream_thread_run(sample_rate, rx, ready_tx, shutdown_rx))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.shutdown = Some(shutdown_tx);
                self.thread = Some(thread);
                Ok(tx)
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(AudioError::DeviceError(
                    "Audio thread exited during setup".to_string(),
                ))
            }
        }
    }

    fn close(&mut self) {
        drop(self.shutdown.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("CPAL stream thread panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "cpal"
    }
}

//! Periodic progress sampling
//!
//! A background thread reads the tracked position every tick and publishes
//! a [`ProgressUpdate`]. It never touches the output lock.

use crate::error::Result;
use crate::timefmt::format_hms;
use crossbeam_channel::{bounded, select, tick, Sender};
use narrator_audio::TrackedHandle;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default sampling period
pub const SAMPLE_PERIOD: Duration = Duration::from_millis(100);

/// One progress reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    /// `current / total`
    pub fraction: f64,
    pub current_seconds: f64,
    pub total_seconds: f64,
    /// Play head in frames
    pub current: usize,
    /// Length in frames
    pub total: usize,
}

impl ProgressUpdate {
    /// Compute a reading, or `None` when `total` or `sample_rate` is zero
    pub fn new(current: usize, total: usize, sample_rate: u32) -> Option<Self> {
        if total == 0 || sample_rate == 0 {
            return None;
        }
        let rate = f64::from(sample_rate);
        Some(Self {
            fraction: current as f64 / total as f64,
            current_seconds: current as f64 / rate,
            total_seconds: total as f64 / rate,
            current,
            total,
        })
    }

    /// Sample a tracked stream now
    pub fn sample(tracker: &TrackedHandle, sample_rate: u32) -> Option<Self> {
        Self::new(tracker.position(), tracker.len(), sample_rate)
    }

    /// `HH:MM:SS` of the play head
    pub fn current_label(&self) -> String {
        format_hms(self.current_seconds)
    }

    /// `HH:MM:SS` of the full length
    pub fn total_label(&self) -> String {
        format_hms(self.total_seconds)
    }
}

/// Receiver of progress readings, called from the sampler thread
pub trait ProgressSink: Send + Sync {
    fn publish(&self, update: ProgressUpdate);
}

/// Running sampler; stops on [`ProgressSampler::stop`] or drop
pub struct ProgressSampler {
    /// Dropped to cancel
    cancel: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ProgressSampler {
    /// Start sampling `tracker` every `period`
    pub fn spawn(
        tracker: TrackedHandle,
        sample_rate: u32,
        sink: Arc<dyn ProgressSink>,
        period: Duration,
    ) -> Result<Self> {
        let (cancel_tx, cancel_rx) = bounded::<()>(0);
        let thread = thread::Builder::new()
            .name("narrator-progress".to_string())
            .spawn(move || {
                let ticker = tick(period);
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            if let Some(update) = ProgressUpdate::sample(&tracker, sample_rate) {
                                sink.publish(update);
                            }
                        }
                        recv(cancel_rx) -> _ => break,
                    }
                }
            })?;

        Ok(Self {
            cancel: Some(cancel_tx),
            thread: Some(thread),
        })
    }

    /// Cancel and wait for the thread; no publish happens after this returns
    pub fn stop(&mut self) {
        drop(self.cancel.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Progress sampler thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }
}

impl Drop for ProgressSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrator_audio::test_utils::SineSource;
    use narrator_audio::{Streamer, Tracked};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<ProgressUpdate>>);

    impl ProgressSink for Collect {
        fn publish(&self, update: ProgressUpdate) {
            self.0.lock().push(update);
        }
    }

    #[test]
    fn test_update_values() {
        let update = ProgressUpdate::new(44100, 44100 * 120, 44100).unwrap();
        assert!((update.fraction - 1.0 / 120.0).abs() < 1e-12);
        assert_eq!(update.current_label(), "00:00:01");
        assert_eq!(update.total_label(), "00:02:00");
    }

    #[test]
    fn test_no_update_for_empty_stream() {
        assert_eq!(ProgressUpdate::new(0, 0, 44100), None);
        assert_eq!(ProgressUpdate::new(10, 100, 0), None);
    }

    #[test]
    fn test_publishes_until_stopped() {
        let mut tracked = Tracked::new(SineSource::new(1000, 10_000));
        let mut buf = vec![[0.0; 2]; 500];
        tracked.stream(&mut buf);

        let sink = Arc::new(Collect::default());
        let mut sampler = ProgressSampler::spawn(
            tracked.handle(),
            1000,
            sink.clone(),
            Duration::from_millis(5),
        )
        .unwrap();

        thread::sleep(Duration::from_millis(100));
        sampler.stop();
        assert!(!sampler.is_running());

        let published = sink.0.lock().len();
        assert!(published > 0);
        let last = sink.0.lock().last().copied().unwrap();
        assert_eq!(last.current, 500);
        assert_eq!(last.total, 10_000);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(sink.0.lock().len(), published);
    }
}

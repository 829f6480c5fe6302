//! Variable-speed resampling stage
//!
//! Uses rubato's fixed-output polynomial resampler so every process call
//! yields exactly one chunk while the input consumed per chunk follows the
//! playback speed.

use crate::error::{AudioError, Result};
use crate::streamer::{fill, Frame, Streamer, SILENCE};
use rubato::{FastFixedOut, PolynomialDegree, Resampler as RubatoResamplerTrait};
use std::collections::VecDeque;

/// Output frames produced per resampler call
const CHUNK_FRAMES: usize = 1024;

/// Relative ratio window the interpolator accepts without a rebuild
const MAX_RELATIVE_RATIO: f64 = 2.0;

/// Plays the source at `ratio` times its native speed
///
/// `ratio > 1` plays faster, `ratio < 1` slower. The output rate is
/// unchanged; the source is consumed correspondingly faster or slower.
pub struct Resample<S> {
    source: S,
    /// Active speed ratio
    ratio: f64,
    /// Speed ratio the interpolator was built for
    built_ratio: f64,
    resampler: FastFixedOut<f32>,
    /// Interleaved input scratch
    input: Vec<Frame>,
    /// Deinterleaved input scratch
    channels: Vec<Vec<f32>>,
    /// Resampled frames not yet handed out
    output: VecDeque<Frame>,
    /// Source reported end of stream
    drained: bool,
    error: Option<AudioError>,
}

impl<S: Streamer> Resample<S> {
    /// Wrap `source` at speed `ratio`
    ///
    /// # Errors
    /// `InvalidRatio` if `ratio` is not finite and positive
    pub fn new(ratio: f64, source: S) -> Result<Self> {
        validate_ratio(ratio)?;
        Ok(Self {
            source,
            ratio,
            built_ratio: ratio,
            resampler: build_resampler(ratio)?,
            input: Vec::new(),
            channels: vec![Vec::new(), Vec::new()],
            output: VecDeque::with_capacity(CHUNK_FRAMES),
            drained: false,
            error: None,
        })
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Replace the speed ratio
    ///
    /// Small changes retune the running interpolator; changes beyond its
    /// relative window rebuild it.
    pub fn set_ratio(&mut self, ratio: f64) -> Result<()> {
        validate_ratio(ratio)?;

        let relative = self.built_ratio / ratio;
        let in_window = relative > 1.0 / MAX_RELATIVE_RATIO && relative < MAX_RELATIVE_RATIO;
        let retuned = in_window
            && self
                .resampler
                .set_resample_ratio(1.0 / ratio, false)
                .is_ok();

        if !retuned {
            tracing::debug!(
                from = self.built_ratio,
                to = ratio,
                "Rebuilding resampler for speed change"
            );
            self.resampler = build_resampler(ratio)?;
            self.built_ratio = ratio;
        }

        self.ratio = ratio;
        Ok(())
    }

    /// Discard buffered output and interpolator history
    ///
    /// After a flush the next frame comes from whatever the source yields
    /// next, so seeks and pauses are not smeared by stale audio.
    pub fn flush(&mut self) {
        self.output.clear();
        self.resampler.reset();
        self.drained = false;
    }

    /// Frames buffered ahead of the consumer
    pub fn buffered(&self) -> usize {
        self.output.len()
    }

    pub fn inner(&self) -> &S {
        &self.source
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Pull one resampler chunk worth of input and queue the output
    fn refill(&mut self) {
        let needed = self.resampler.input_frames_next();
        self.input.resize(needed, SILENCE);

        let (n, more) = fill(&mut self.source, &mut self.input[..needed]);
        if !more {
            self.drained = true;
            if n == 0 {
                return;
            }
        }
        self.input[n..].fill(SILENCE);

        for (ch, channel) in self.channels.iter_mut().enumerate() {
            channel.clear();
            channel.extend(self.input.iter().map(|frame| frame[ch]));
        }

        match self.resampler.process(&self.channels, None) {
            Ok(resampled) => {
                let produced = resampled[0].len();
                // Drop the padding that stands in for input past the end
                let keep = if n < needed {
                    ((n as f64 / self.ratio).ceil() as usize).min(produced)
                } else {
                    produced
                };
                self.output
                    .extend((0..keep).map(|i| [resampled[0][i], resampled[1][i]]));
            }
            Err(e) => {
                tracing::error!("Resampling failed: {}", e);
                self.error = Some(AudioError::Resample(e.to_string()));
                self.drained = true;
            }
        }
    }
}

impl<S: Streamer> Streamer for Resample<S> {
    fn stream(&mut self, frames: &mut [Frame]) -> (usize, bool) {
        let mut filled = 0;
        while filled < frames.len() {
            if self.output.is_empty() {
                if self.drained {
                    break;
                }
                self.refill();
                continue;
            }

            let n = self.output.len().min(frames.len() - filled);
            for (dst, src) in frames[filled..filled + n]
                .iter_mut()
                .zip(self.output.drain(..n))
            {
                *dst = src;
            }
            filled += n;
        }

        (filled, !(self.drained && self.output.is_empty()))
    }

    fn err(&self) -> Option<&AudioError> {
        self.error.as_ref().or_else(|| self.source.err())
    }
}

fn validate_ratio(ratio: f64) -> Result<()> {
    if ratio.is_finite() && ratio > 0.0 {
        Ok(())
    } else {
        Err(AudioError::InvalidRatio(ratio))
    }
}

/// Build a stereo cubic interpolator for speed `ratio`
///
/// rubato's ratio is output/input, the inverse of playback speed.
fn build_resampler(ratio: f64) -> Result<FastFixedOut<f32>> {
    FastFixedOut::new(
        1.0 / ratio,
        MAX_RELATIVE_RATIO,
        PolynomialDegree::Cubic,
        CHUNK_FRAMES,
        2,
    )
    .map_err(|e| AudioError::Resample(format!("FastFixedOut creation failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streamer::StreamSeeker;
    use crate::test_utils::SineSource;

    fn pull(resample: &mut Resample<SineSource>, frames: usize) -> Vec<Frame> {
        let mut buf = vec![SILENCE; frames];
        let (n, _) = resample.stream(&mut buf);
        buf.truncate(n);
        buf
    }

    #[test]
    fn test_rejects_invalid_ratios() {
        for ratio in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = Resample::new(ratio, SineSource::new(44100, 1000));
            assert!(matches!(result, Err(AudioError::InvalidRatio(_))));
        }

        let mut resample = Resample::new(1.0, SineSource::new(44100, 1000)).unwrap();
        assert!(resample.set_ratio(0.0).is_err());
        assert_eq!(resample.ratio(), 1.0);
    }

    #[test]
    fn test_unity_ratio_consumes_at_nominal_rate() {
        let mut resample = Resample::new(1.0, SineSource::new(44100, 441_000)).unwrap();
        let out = pull(&mut resample, 44100);

        assert_eq!(out.len(), 44100);
        let consumed = resample.inner().position();
        // Consumption runs at most one chunk ahead of output
        assert!(consumed >= 44100);
        assert!(consumed <= 44100 + 2 * CHUNK_FRAMES);
    }

    #[test]
    fn test_double_speed_consumes_twice() {
        let mut resample = Resample::new(2.0, SineSource::new(44100, 441_000)).unwrap();
        pull(&mut resample, 44100);

        let consumed = resample.inner().position() as f64;
        assert!(consumed > 2.0 * 44100.0 * 0.95);
        assert!(consumed < 2.0 * 44100.0 * 1.1);
    }

    #[test]
    fn test_half_speed_consumes_half() {
        let mut resample = Resample::new(0.5, SineSource::new(44100, 441_000)).unwrap();
        pull(&mut resample, 44100);

        let consumed = resample.inner().position() as f64;
        assert!(consumed > 0.5 * 44100.0 * 0.95);
        assert!(consumed < 0.5 * 44100.0 * 1.1);
    }

    #[test]
    fn test_large_jump_rebuilds() {
        let mut resample = Resample::new(1.0, SineSource::new(44100, 441_000)).unwrap();
        resample.set_ratio(16.0 / 15.0).unwrap();
        assert_eq!(resample.built_ratio, 1.0);

        resample.set_ratio(4.0).unwrap();
        assert_eq!(resample.built_ratio, 4.0);
        assert_eq!(resample.ratio(), 4.0);

        // Still produces full buffers after the rebuild
        assert_eq!(pull(&mut resample, 4096).len(), 4096);
    }

    #[test]
    fn test_drains_with_source() {
        let mut resample = Resample::new(1.0, SineSource::new(44100, 3000)).unwrap();
        let mut buf = vec![SILENCE; 10_000];
        let (n, more) = resample.stream(&mut buf);

        assert!(!more);
        assert!(n >= 3000 - CHUNK_FRAMES);
        assert!(n <= 3000 + CHUNK_FRAMES);
    }

    #[test]
    fn test_flush_discards_buffered_output() {
        let mut resample = Resample::new(1.0, SineSource::new(44100, 441_000)).unwrap();
        pull(&mut resample, 100);
        assert!(resample.buffered() > 0);

        resample.flush();
        assert_eq!(resample.buffered(), 0);
    }
}

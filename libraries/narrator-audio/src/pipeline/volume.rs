//! Exponential volume stage

use crate::error::AudioError;
use crate::streamer::{Frame, Streamer};

/// Scales every sample by `base^level`
///
/// `level == 0` is unity gain. There is no ceiling; clipping is left to
/// the device.
pub struct Volume<S> {
    source: S,
    base: f64,
    level: f64,
}

impl<S: Streamer> Volume<S> {
    pub fn new(base: f64, level: f64, source: S) -> Self {
        Self {
            source,
            base,
            level,
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn set_level(&mut self, level: f64) {
        self.level = level;
    }

    /// Linear gain for the current level
    pub fn gain(&self) -> f32 {
        self.base.powf(self.level) as f32
    }

    pub fn inner(&self) -> &S {
        &self.source
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: Streamer> Streamer for Volume<S> {
    fn stream(&mut self, frames: &mut [Frame]) -> (usize, bool) {
        let (n, more) = self.source.stream(frames);
        let gain = self.gain();
        if gain != 1.0 {
            for frame in &mut frames[..n] {
                frame[0] *= gain;
                frame[1] *= gain;
            }
        }
        (n, more)
    }

    fn err(&self) -> Option<&AudioError> {
        self.source.err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::SineSource;

    #[test]
    fn test_unity_at_level_zero() {
        let mut volume = Volume::new(2.0, 0.0, SineSource::new(44100, 100));
        let mut buf = vec![[0.0; 2]; 10];
        volume.stream(&mut buf);
        assert_eq!(buf[3], SineSource::frame_at(44100, 3));
    }

    #[test]
    fn test_level_one_doubles() {
        let mut volume = Volume::new(2.0, 1.0, SineSource::new(44100, 100));
        let mut buf = vec![[0.0; 2]; 10];
        volume.stream(&mut buf);

        let expected = SineSource::frame_at(44100, 7)[0] * 2.0;
        assert!((buf[7][0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_negative_level_attenuates() {
        let volume = Volume::new(2.0, -1.0, SineSource::new(44100, 100));
        assert!((volume.gain() - 0.5).abs() < 1e-6);
    }
}

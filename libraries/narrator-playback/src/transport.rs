//! Transport state machine
//!
//! ```text
//! NoFile --open--> Loaded --play--> Playing <--pause/play--> Paused
//!    any state --open--> Loaded
//! ```

use std::path::PathBuf;

/// Volume level change per step (log₂ units)
pub const VOLUME_STEP: f64 = 0.1;

/// Numerator and denominator of one speed step
const SPEED_STEP_NUM: f64 = 16.0;
const SPEED_STEP_DEN: f64 = 15.0;

/// Skip distance in seconds
pub const SKIP_SECONDS: f64 = 30.0;

/// Ratio after one speed increase
pub fn speed_up(ratio: f64) -> f64 {
    ratio * SPEED_STEP_NUM / SPEED_STEP_DEN
}

/// Ratio after one speed decrease
pub fn speed_down(ratio: f64) -> f64 {
    ratio * SPEED_STEP_DEN / SPEED_STEP_NUM
}

/// Player state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    /// Nothing opened yet
    #[default]
    NoFile,
    /// File decoded and output initialised, not started
    Loaded,
    Playing,
    Paused,
}

/// User request
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Open(PathBuf),
    Play,
    Pause,
    VolumeUp,
    VolumeDown,
    SpeedUp,
    SpeedDown,
    SkipForward,
    SkipBack,
}

/// Which affordances are enabled
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub open: bool,
    pub play: bool,
    pub pause: bool,
    pub volume_down: bool,
    pub volume_up: bool,
    pub skip_back: bool,
    pub skip_forward: bool,
    pub speed_down: bool,
    pub speed_up: bool,
}

impl TransportState {
    /// Enabled affordances in this state
    ///
    /// Open is always available. Mutators are only offered while playing.
    pub fn controls(self) -> Controls {
        let playing = self == TransportState::Playing;
        Controls {
            open: true,
            play: matches!(self, TransportState::Loaded | TransportState::Paused),
            pause: playing,
            volume_down: playing,
            volume_up: playing,
            skip_back: playing,
            skip_forward: playing,
            speed_down: playing,
            speed_up: playing,
        }
    }

    /// Whether `intent` is accepted in this state
    pub fn allows(self, intent: &Intent) -> bool {
        let controls = self.controls();
        match intent {
            Intent::Open(_) => controls.open,
            Intent::Play => controls.play,
            Intent::Pause => controls.pause,
            Intent::VolumeUp => controls.volume_up,
            Intent::VolumeDown => controls.volume_down,
            Intent::SpeedUp => controls.speed_up,
            Intent::SpeedDown => controls.speed_down,
            Intent::SkipForward => controls.skip_forward,
            Intent::SkipBack => controls.skip_back,
        }
    }

    /// State after `intent` succeeds
    pub fn next(self, intent: &Intent) -> Self {
        match intent {
            Intent::Open(_) => TransportState::Loaded,
            Intent::Play => TransportState::Playing,
            Intent::Pause => TransportState::Paused,
            _ => self,
        }
    }
}

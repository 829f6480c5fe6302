//! Player façade
//!
//! Owns the speaker and at most one [`Session`], dispatches user intents
//! through the transport state machine and persists the session on close.
//! The UI holds only the player and a [`PlayerView`].

use crate::error::{PlaybackError, Result};
use crate::loader::{LoadedSource, SourceLoader};
use crate::persister::{ResumeOffer, SessionStore};
use crate::sampler::{ProgressSampler, ProgressUpdate, SAMPLE_PERIOD};
use crate::session::Session;
use crate::transport::{
    speed_down, speed_up, Controls, Intent, TransportState, SKIP_SECONDS, VOLUME_STEP,
};
use crate::view::{PlayerView, ViewSink, STATUS_IDLE};
use narrator_audio::{AudioError, AudioPipeline, OutputDevice, Speaker};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Output buffer length as a fraction of a second
const BUFFER_DIVISOR: u32 = 10;

/// Audiobook player
pub struct Player {
    speaker: Speaker,
    loader: Box<dyn SourceLoader>,
    store: SessionStore,
    view: Arc<dyn PlayerView>,
    session: Option<Session>,
    state: TransportState,
    sample_period: Duration,
    closed: bool,
}

impl Player {
    /// Create an idle player
    ///
    /// # Arguments
    /// * `device` - Output backend driven by the player's speaker
    /// * `loader` - Decoder for opened files
    /// * `store` - Last-session persistence
    /// * `view` - Where status, progress and controls are shown
    pub fn new(
        device: Box<dyn OutputDevice>,
        loader: Box<dyn SourceLoader>,
        store: SessionStore,
        view: Arc<dyn PlayerView>,
    ) -> Self {
        let player = Self {
            speaker: Speaker::new(device),
            loader,
            store,
            view,
            session: None,
            state: TransportState::NoFile,
            sample_period: SAMPLE_PERIOD,
            closed: false,
        };
        player.view.show_status(STATUS_IDLE);
        player.view.show_cover(None);
        player.view.set_controls(player.state.controls());
        player
    }

    /// Override the progress sampling period
    #[must_use]
    pub fn with_sample_period(mut self, period: Duration) -> Self {
        self.sample_period = period;
        self
    }

    /// Check the saved session; `Some` means the UI should ask to resume
    pub fn startup(&mut self) -> Option<ResumeOffer> {
        self.store.resume_offer()
    }

    /// Apply a user intent
    ///
    /// Intents not allowed in the current state are ignored.
    pub fn handle(&mut self, intent: Intent) {
        if self.closed {
            return;
        }
        if !self.state.allows(&intent) {
            tracing::debug!(?intent, state = ?self.state, "Ignoring intent");
            return;
        }

        let next = self.state.next(&intent);
        match intent {
            Intent::Open(path) => self.open(&path, next),
            Intent::Play => self.play(next),
            Intent::Pause => self.pause(next),
            Intent::VolumeUp => self.with_pipeline(|p| p.set_volume(VOLUME_STEP)),
            Intent::VolumeDown => self.with_pipeline(|p| p.set_volume(-VOLUME_STEP)),
            Intent::SpeedUp => self.change_speed(speed_up),
            Intent::SpeedDown => self.change_speed(speed_down),
            Intent::SkipForward => self.with_pipeline(|p| p.skip(SKIP_SECONDS)),
            Intent::SkipBack => self.with_pipeline(|p| p.skip(-SKIP_SECONDS)),
        }
    }

    /// Resume the offered session
    ///
    /// On failure the saved session is cleared and the error is shown.
    pub fn accept_resume(&mut self, offer: &ResumeOffer) -> Result<()> {
        match self.resume(offer) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(path = %offer.path.display(), "Resume failed: {}", e);
                if let Err(clear_err) = self.store.clear() {
                    tracing::warn!("Failed to clear saved session: {}", clear_err);
                }
                self.drop_orphaned_session();
                self.view
                    .show_error(&format!("Could not resume {}: {}", offer.file_name, e));
                Err(e)
            }
        }
    }

    /// Forget the saved session
    pub fn decline_resume(&mut self) -> Result<()> {
        tracing::info!("Resume declined; clearing saved session");
        self.store.clear()
    }

    /// Persist the session and release the output device
    ///
    /// Idempotent; also runs on drop.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(session) = &self.session {
            let was_playing = self.state == TransportState::Playing;
            let saved = session
                .record(was_playing)
                .and_then(|record| self.store.save(&record));
            if let Err(e) = saved {
                tracing::warn!("Failed to save session: {}", e);
            }
        }

        if let Some(mut session) = self.session.take() {
            session.end();
        }
        self.speaker.close();
        tracing::info!("Player closed");
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn controls(&self) -> Controls {
        self.state.controls()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Progress of the current session, computed now
    pub fn progress(&self) -> Option<ProgressUpdate> {
        self.session.as_ref().and_then(Session::progress)
    }

    pub fn speed(&self) -> Option<f64> {
        self.session.as_ref().map(|s| s.pipeline().speed())
    }

    pub fn volume(&self) -> Option<f64> {
        self.session.as_ref().map(|s| s.pipeline().volume())
    }

    fn open(&mut self, path: &Path, next: TransportState) {
        match self.load_session(path) {
            Ok(session) => {
                let status = format!("Playing: {}", session.file_name());
                tracing::info!(path = %path.display(), "Opened file");
                self.install(session, next, &status);
            }
            Err(PlaybackError::Audio(AudioError::EmptyStream)) => {
                tracing::warn!(path = %path.display(), "Stream has no samples; not loaded");
            }
            Err(e) => {
                tracing::error!(path = %path.display(), "Failed to open file: {}", e);
                self.view.show_error(&format!(
                    "Failed to open {}: {}",
                    crate::persister::file_name(path),
                    e
                ));
            }
        }
        self.drop_orphaned_session();
    }

    fn resume(&mut self, offer: &ResumeOffer) -> Result<()> {
        let session = self.load_session(&offer.path)?;

        let pipeline = session.pipeline();
        let target = (offer.position_seconds * f64::from(pipeline.sample_rate())).round();
        let target = if target.is_finite() && target > 0.0 {
            target as usize
        } else {
            0
        };
        let landed = pipeline.seek(target)?;
        tracing::info!(
            path = %offer.path.display(),
            position = landed,
            playing = offer.was_playing,
            "Resumed session"
        );

        let status = format!("Resumed: {}", session.file_name());
        let loaded = self.state.next(&Intent::Open(offer.path.clone()));
        let playing = loaded.next(&Intent::Play);
        if offer.was_playing {
            self.install(session, loaded, &status);
            self.play(playing);
        } else {
            pipeline.pause();
            self.install(session, playing.next(&Intent::Pause), &status);
        }
        Ok(())
    }

    /// Decode `path` and build a session, re-initialising the speaker
    fn load_session(&mut self, path: &Path) -> Result<Session> {
        let LoadedSource {
            source,
            sample_rate,
        } = self.loader.load(path)?;
        if source.len() == 0 {
            return Err(AudioError::EmptyStream.into());
        }

        let buffer_frames = (sample_rate / BUFFER_DIVISOR).max(1) as usize;
        let handle = self.speaker.init(sample_rate, buffer_frames)?;
        let pipeline = AudioPipeline::new(source, sample_rate, handle)?;
        let sampler = ProgressSampler::spawn(
            pipeline.tracker(),
            sample_rate,
            Arc::new(ViewSink(Arc::clone(&self.view))),
            self.sample_period,
        )?;

        Ok(Session::new(path, pipeline, sampler))
    }

    /// Replace the current session and refresh the view
    fn install(&mut self, session: Session, state: TransportState, status: &str) {
        if let Some(mut old) = self.session.take() {
            old.end();
        }

        self.view.show_status(status);
        self.view.show_cover(session.cover());
        if let Some(update) = session.progress() {
            self.view.show_progress(&update);
        }
        self.session = Some(session);
        self.set_state(state);
    }

    /// A failed load may have re-initialised the speaker under the old
    /// session; such a session can no longer play and is dropped.
    fn drop_orphaned_session(&mut self) {
        let orphaned = self
            .session
            .as_ref()
            .is_some_and(|s| !s.pipeline().is_output_current());
        if orphaned {
            tracing::warn!("Previous session lost its output; unloading");
            if let Some(mut old) = self.session.take() {
                old.end();
            }
            self.view.show_status(STATUS_IDLE);
            self.view.show_cover(None);
            self.set_state(TransportState::NoFile);
        }
    }

    fn play(&mut self, next: TransportState) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.pipeline_mut().play();
        self.set_state(next);
    }

    fn pause(&mut self, next: TransportState) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        session.pipeline().pause();
        self.set_state(next);
    }

    fn change_speed(&mut self, step: fn(f64) -> f64) {
        self.with_pipeline(|p| {
            let ratio = step(p.speed());
            if let Err(e) = p.set_speed(ratio) {
                tracing::warn!(ratio, "Speed change rejected: {}", e);
            }
        });
    }

    fn with_pipeline(&self, f: impl FnOnce(&AudioPipeline)) {
        if let Some(session) = &self.session {
            f(session.pipeline());
        }
    }

    fn set_state(&mut self, state: TransportState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "Transport state changed");
        }
        self.state = state;
        self.view.set_controls(state.controls());
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.close();
    }
}

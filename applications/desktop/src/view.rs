//! Player state as the window renders it
//!
//! The player and the progress sampler thread write here; the egui update
//! loop reads a snapshot every frame.

use narrator_playback::{format_hms, Controls, PlayerView, ProgressUpdate};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// What the window shows
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub status: String,
    pub cover: Option<PathBuf>,
    pub controls: Controls,
    pub fraction: f32,
    pub current: String,
    pub total: String,
}

/// `PlayerView` backed by shared state plus a repaint request
pub struct WindowView {
    state: Mutex<ViewState>,
    errors: Mutex<Vec<String>>,
    ctx: egui::Context,
}

impl WindowView {
    pub fn new(ctx: egui::Context) -> Self {
        let state = ViewState {
            current: format_hms(0.0),
            total: format_hms(0.0),
            ..ViewState::default()
        };
        Self {
            state: Mutex::new(state),
            errors: Mutex::new(Vec::new()),
            ctx,
        }
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.lock().clone()
    }

    /// Errors not yet shown to the user
    pub fn take_errors(&self) -> Vec<String> {
        std::mem::take(&mut *self.errors.lock())
    }

    fn update(&self, f: impl FnOnce(&mut ViewState)) {
        f(&mut self.state.lock());
        self.ctx.request_repaint();
    }
}

impl PlayerView for WindowView {
    fn show_status(&self, text: &str) {
        self.update(|s| s.status = text.to_string());
    }

    fn show_cover(&self, image: Option<&Path>) {
        self.update(|s| s.cover = image.map(Path::to_path_buf));
    }

    fn set_controls(&self, controls: Controls) {
        self.update(|s| s.controls = controls);
    }

    fn show_progress(&self, update: &ProgressUpdate) {
        self.update(|s| {
            s.fraction = update.fraction as f32;
            s.current = update.current_label();
            s.total = update.total_label();
        });
    }

    fn show_error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
        self.ctx.request_repaint();
    }
}

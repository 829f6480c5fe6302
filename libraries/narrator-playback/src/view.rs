//! Observer interface the player drives

use crate::sampler::{ProgressSink, ProgressUpdate};
use crate::transport::Controls;
use std::path::Path;
use std::sync::Arc;

/// Initial status text
pub const STATUS_IDLE: &str = "Select an MP3 file...";

/// What the player shows to the user
///
/// Implementations are called from the UI thread, except `show_progress`
/// which also arrives from the progress sampler thread.
pub trait PlayerView: Send + Sync {
    fn show_status(&self, text: &str);

    /// Cover art for the current file, `None` to clear
    fn show_cover(&self, image: Option<&Path>);

    fn set_controls(&self, controls: Controls);

    fn show_progress(&self, update: &ProgressUpdate);

    /// Report a failure the user asked for (e.g. opening a bad file)
    fn show_error(&self, message: &str);
}

/// Adapts a [`PlayerView`] to the sampler's sink
pub(crate) struct ViewSink(pub Arc<dyn PlayerView>);

impl ProgressSink for ViewSink {
    fn publish(&self, update: ProgressUpdate) {
        self.0.show_progress(&update);
    }
}

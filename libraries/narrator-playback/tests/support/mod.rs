//! Shared fixtures for player integration tests

#![allow(dead_code)]

use narrator_audio::test_utils::SineSource;
use narrator_audio::{AudioError, MemoryDevice, MemoryOutput};
use narrator_playback::{
    Controls, LoadedSource, PlaybackError, Player, PlayerView, ProgressUpdate, SessionStore,
    SourceLoader,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const RATE: u32 = 44100;
pub const BUFFER: usize = RATE as usize / 10;
pub const TIMEOUT: Duration = Duration::from_secs(5);
/// Long enough for the speaker thread to fill a buffer and block on send
pub const SETTLE: Duration = Duration::from_millis(50);

// ===== View =====

#[derive(Debug, Default, Clone)]
pub struct ViewState {
    pub status: String,
    pub cover: Option<PathBuf>,
    pub controls: Controls,
    pub progress: Vec<ProgressUpdate>,
    pub errors: Vec<String>,
}

/// Records everything the player shows
#[derive(Default)]
pub struct RecordingView {
    state: Mutex<ViewState>,
}

impl RecordingView {
    pub fn snapshot(&self) -> ViewState {
        self.state.lock().clone()
    }
}

impl PlayerView for RecordingView {
    fn show_status(&self, text: &str) {
        self.state.lock().status = text.to_string();
    }

    fn show_cover(&self, image: Option<&Path>) {
        self.state.lock().cover = image.map(Path::to_path_buf);
    }

    fn set_controls(&self, controls: Controls) {
        self.state.lock().controls = controls;
    }

    fn show_progress(&self, update: &ProgressUpdate) {
        self.state.lock().progress.push(*update);
    }

    fn show_error(&self, message: &str) {
        self.state.lock().errors.push(message.to_string());
    }
}

// ===== Loader =====

/// Serves sine waves for files that exist on disk
///
/// Durations are looked up by file name (default 120 s). Files named
/// `corrupt.mp3` fail to decode.
#[derive(Default, Clone)]
pub struct SineLoader {
    durations: HashMap<String, f64>,
}

impl SineLoader {
    pub fn with(mut self, name: &str, seconds: f64) -> Self {
        self.durations.insert(name.to_string(), seconds);
        self
    }
}

impl SourceLoader for SineLoader {
    fn load(&self, path: &Path) -> narrator_playback::Result<LoadedSource> {
        if !path.exists() {
            return Err(AudioError::FileNotFound(path.display().to_string()).into());
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name == "corrupt.mp3" {
            return Err(PlaybackError::Audio(AudioError::DecodeError(
                "bad frame header".to_string(),
            )));
        }
        let seconds = self.durations.get(&name).copied().unwrap_or(120.0);
        Ok(LoadedSource {
            source: Box::new(SineSource::with_duration(RATE, seconds)),
            sample_rate: RATE,
        })
    }
}

// ===== Harness =====

pub struct Harness {
    pub dir: TempDir,
    pub player: Player,
    pub output: MemoryOutput,
    pub view: Arc<RecordingView>,
}

impl Harness {
    pub fn new(loader: SineLoader) -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self::in_dir(dir, loader)
    }

    /// Build a player whose preferences live in `dir`
    pub fn in_dir(dir: TempDir, loader: SineLoader) -> Self {
        let (device, output) = MemoryDevice::new();
        let view = Arc::new(RecordingView::default());
        let store = SessionStore::open(&dir.path().join("prefs"));
        let player = Player::new(Box::new(device), Box::new(loader), store, view.clone())
            .with_sample_period(Duration::from_millis(10));
        Self {
            dir,
            player,
            output,
            view,
        }
    }

    /// Create an (empty) file in the temp dir and return its path
    pub fn file(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, b"").unwrap();
        path
    }

    pub fn prefs_dir(&self) -> PathBuf {
        self.dir.path().join("prefs")
    }

    /// Let the speaker thread fill its next buffer and block
    pub fn settle(&self) {
        std::thread::sleep(SETTLE);
    }

    pub fn position(&self) -> usize {
        self.player.session().unwrap().pipeline().position()
    }

    pub fn len(&self) -> usize {
        self.player.session().unwrap().pipeline().len()
    }
}

pub fn is_silent(buffer: &[[f32; 2]]) -> bool {
    buffer.iter().all(|f| *f == [0.0, 0.0])
}

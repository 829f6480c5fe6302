//! Last-session persistence
//!
//! Three keys are always read and written together:
//!
//! | Key | Type | Meaning |
//! |---|---|---|
//! | `lastFile` | string | `file://` URI of the last file, may be empty |
//! | `lastPosition` | float | seconds into the file |
//! | `wasPlaying` | bool | whether playback was running at close |

use crate::error::{PlaybackError, Result};
use crate::preferences::Preferences;
use std::path::{Path, PathBuf};
use url::Url;

pub const KEY_LAST_FILE: &str = "lastFile";
pub const KEY_LAST_POSITION: &str = "lastPosition";
pub const KEY_WAS_PLAYING: &str = "wasPlaying";

/// The persisted last-session triple
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionRecord {
    pub last_file_uri: String,
    pub last_position: f64,
    pub was_playing: bool,
}

/// A saved session worth offering to resume
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeOffer {
    pub path: PathBuf,
    pub file_name: String,
    pub position_seconds: f64,
    pub was_playing: bool,
}

/// Reads and writes the [`SessionRecord`] through a [`Preferences`] store
#[derive(Debug, Clone)]
pub struct SessionStore {
    prefs: Preferences,
}

/// `file://` URI for a filesystem path
///
/// Relative paths are resolved against the current directory first.
pub fn file_uri(path: &Path) -> Result<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| PlaybackError::InvalidUri(absolute.display().to_string()))
}

/// Filesystem path for a `file://` URI
pub fn path_from_uri(uri: &str) -> Result<PathBuf> {
    let url = Url::parse(uri).map_err(|e| PlaybackError::InvalidUri(format!("{uri}: {e}")))?;
    if url.scheme() != "file" {
        return Err(PlaybackError::InvalidUri(uri.to_string()));
    }
    url.to_file_path()
        .map_err(|()| PlaybackError::InvalidUri(uri.to_string()))
}

/// Display name of a file: its last path component
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl SessionStore {
    pub fn new(prefs: Preferences) -> Self {
        Self { prefs }
    }

    /// Store backed by `preferences.json` in `dir`
    pub fn open(dir: &Path) -> Self {
        Self::new(Preferences::load_from_dir(dir))
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Read all three keys
    pub fn load(&self) -> SessionRecord {
        let record = SessionRecord {
            last_file_uri: self.prefs.string(KEY_LAST_FILE),
            last_position: self.prefs.float(KEY_LAST_POSITION),
            was_playing: self.prefs.bool(KEY_WAS_PLAYING),
        };
        tracing::info!(
            file = %record.last_file_uri,
            position = record.last_position,
            playing = record.was_playing,
            "Loading preferences"
        );
        record
    }

    /// Write all three keys and flush to disk
    pub fn save(&mut self, record: &SessionRecord) -> Result<()> {
        tracing::info!(
            file = %record.last_file_uri,
            position = record.last_position,
            playing = record.was_playing,
            "Saving preferences"
        );
        self.prefs.set_string(KEY_LAST_FILE, &record.last_file_uri);
        self.prefs.set_float(KEY_LAST_POSITION, record.last_position);
        self.prefs.set_bool(KEY_WAS_PLAYING, record.was_playing);
        self.prefs.save()
    }

    /// Reset all three keys
    pub fn clear(&mut self) -> Result<()> {
        self.save(&SessionRecord::default())
    }

    /// Reset only the file reference
    fn clear_last_file(&mut self) -> Result<()> {
        self.prefs.set_string(KEY_LAST_FILE, "");
        self.prefs.save()
    }

    /// Decide whether the saved session can be resumed
    ///
    /// Clears what is no longer valid: a malformed URI clears `lastFile`,
    /// a file that has disappeared clears all three keys.
    pub fn resume_offer(&mut self) -> Option<ResumeOffer> {
        let record = self.load();
        if record.last_file_uri.is_empty()
            || record.last_position.is_nan()
            || record.last_position <= 0.0
        {
            return None;
        }

        let path = match path_from_uri(&record.last_file_uri) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Error parsing saved URI: {}", e);
                if let Err(e) = self.clear_last_file() {
                    tracing::warn!("Failed to clear saved URI: {}", e);
                }
                return None;
            }
        };

        if !path.is_file() {
            tracing::info!(path = %path.display(), "Saved file no longer exists");
            if let Err(e) = self.clear() {
                tracing::warn!("Failed to clear saved session: {}", e);
            }
            return None;
        }

        Some(ResumeOffer {
            file_name: file_name(&path),
            path,
            position_seconds: record.last_position,
            was_playing: record.was_playing,
        })
    }
}

//! Error types for playback management

use narrator_audio::AudioError;
use thiserror::Error;

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Playback errors
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Decoding, pipeline or device failure
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// Preferences I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Preferences file is not valid JSON
    #[error("Preferences format error: {0}")]
    Json(#[from] serde_json::Error),

    /// Saved file reference is not a usable file URI
    #[error("Invalid file URI: {0}")]
    InvalidUri(String),

    /// No per-user configuration directory on this platform
    #[error("Could not determine config directory")]
    NoConfigDir,
}

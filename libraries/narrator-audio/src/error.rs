/// Audio-specific errors
use thiserror::Error;

/// Result type alias using `AudioError`
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio error types
#[derive(Error, Debug)]
pub enum AudioError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Decoding error
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Stream decoded to zero samples
    #[error("Stream has no samples")]
    EmptyStream,

    /// Seek target outside the stream
    #[error("Seek position {position} out of range (length {len})")]
    SeekOutOfRange { position: usize, len: usize },

    /// Seek rejected by the container
    #[error("Seek error: {0}")]
    SeekError(String),

    /// Playback speed ratio that cannot be resampled
    #[error("Invalid speed ratio: {0}")]
    InvalidRatio(f64),

    /// Resampler construction or processing failure
    #[error("Resampling error: {0}")]
    Resample(String),

    /// Output device failure
    #[error("Device error: {0}")]
    DeviceError(String),

    /// Audio device not found
    #[error("Audio device not found")]
    DeviceNotFound,

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Symphonia error
    #[error("Symphonia error: {0}")]
    Symphonia(String),
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AudioError::Symphonia(err.to_string())
    }
}

#[cfg(feature = "desktop")]
impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        AudioError::DeviceError(err.to_string())
    }
}

#[cfg(feature = "desktop")]
impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AudioError::DeviceError(err.to_string())
    }
}

//! Narrator Audio - decoding, pipeline stages and the output driver
//!
//! This crate turns an MP3 file into a pull-based stream of stereo frames
//! and feeds it to an output device:
//!
//! ```text
//! Mp3Decoder -> Tracked -> Loop -> Ctrl -> Resample -> Volume -> Speaker
//! ```
//!
//! # Features
//!
//! - `desktop`: cpal output backend ([`output::CpalDevice`])
//! - `test-utils`: synthetic sources and an in-memory output device

pub mod decoder;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod streamer;
pub mod tracked;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use decoder::{decode, Mp3Decoder};
pub use error::{AudioError, Result};
pub use output::{NullDevice, OutputDevice, Speaker, SpeakerHandle};
pub use pipeline::{AudioPipeline, Ctrl, Loop, Resample, Volume};
pub use streamer::{Frame, StreamSeeker, Streamer};
pub use tracked::{Tracked, TrackedHandle};

#[cfg(feature = "desktop")]
pub use output::CpalDevice;

#[cfg(any(test, feature = "test-utils"))]
pub use output::{MemoryDevice, MemoryOutput};

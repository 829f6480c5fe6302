//! Turning a path into a decoded source

use crate::error::Result;
use narrator_audio::StreamSeeker;
use std::path::Path;

/// A decoded, seekable stream and its native rate
pub struct LoadedSource {
    pub source: Box<dyn StreamSeeker>,
    pub sample_rate: u32,
}

/// Decodes files for the player
pub trait SourceLoader: Send {
    fn load(&self, path: &Path) -> Result<LoadedSource>;
}

/// Production loader backed by the MP3 decoder
#[derive(Debug, Default, Clone, Copy)]
pub struct Mp3Loader;

impl SourceLoader for Mp3Loader {
    fn load(&self, path: &Path) -> Result<LoadedSource> {
        let decoder = narrator_audio::decode(path)?;
        Ok(LoadedSource {
            sample_rate: decoder.sample_rate(),
            source: Box::new(decoder),
        })
    }
}

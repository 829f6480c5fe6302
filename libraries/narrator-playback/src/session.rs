//! One opened file bound to one pipeline

use crate::cover::find_cover_image;
use crate::persister::{file_name, file_uri, SessionRecord};
use crate::sampler::{ProgressSampler, ProgressUpdate};
use narrator_audio::AudioPipeline;
use std::path::{Path, PathBuf};

/// Runtime binding of a file to its pipeline and progress sampler
///
/// Dropping a session stops its sampler and unregisters the pipeline from
/// the speaker.
pub struct Session {
    path: PathBuf,
    file_name: String,
    cover: Option<PathBuf>,
    // Declared before the pipeline so the sampler stops first
    sampler: ProgressSampler,
    pipeline: AudioPipeline,
}

impl Session {
    pub fn new(path: &Path, pipeline: AudioPipeline, sampler: ProgressSampler) -> Self {
        Self {
            path: path.to_path_buf(),
            file_name: file_name(path),
            cover: find_cover_image(path),
            sampler,
            pipeline,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn cover(&self) -> Option<&Path> {
        self.cover.as_deref()
    }

    pub fn pipeline(&self) -> &AudioPipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut AudioPipeline {
        &mut self.pipeline
    }

    /// Progress right now
    pub fn progress(&self) -> Option<ProgressUpdate> {
        ProgressUpdate::sample(&self.pipeline.tracker(), self.pipeline.sample_rate())
    }

    /// Play head in seconds
    pub fn position_seconds(&self) -> f64 {
        self.pipeline.position() as f64 / f64::from(self.pipeline.sample_rate())
    }

    /// Record to persist for this session
    pub fn record(&self, was_playing: bool) -> crate::Result<SessionRecord> {
        Ok(SessionRecord {
            last_file_uri: file_uri(&self.path)?,
            last_position: self.position_seconds(),
            was_playing,
        })
    }

    /// Stop sampling and detach from the speaker
    pub fn end(&mut self) {
        self.sampler.stop();
        self.pipeline.detach();
    }
}

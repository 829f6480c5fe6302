/// Desktop configuration
use narrator_playback::preferences;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the optional configuration file in the config directory
pub const CONFIG_FILE: &str = "narrator.toml";

/// Prefix of environment overrides, e.g. `NARRATOR_AUDIO_BACKEND=null`
pub const ENV_PREFIX: &str = "NARRATOR";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DesktopConfig {
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,

    /// Where `preferences.json` lives; the platform config dir when unset
    pub preferences_dir: Option<PathBuf>,

    pub audio_backend: AudioBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioBackend {
    /// System audio device
    #[default]
    Cpal,
    /// Discard output at real-time pace
    Null,
}

impl DesktopConfig {
    /// Load configuration from the config directory and environment
    pub fn load() -> anyhow::Result<Self> {
        let file = preferences::default_dir()
            .ok()
            .map(|dir| dir.join(CONFIG_FILE));
        Self::load_from(file.as_deref(), environment())
    }

    /// Load from an optional file, then apply `env` on top
    pub fn load_from(file: Option<&Path>, env: config::Environment) -> anyhow::Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = file.filter(|p| p.exists()) {
            settings = settings.add_source(config::File::from(path));
        }
        settings = settings.add_source(env);

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Directory holding the preferences store
    pub fn preferences_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.preferences_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(preferences::default_dir()?),
        }
    }
}

/// `NARRATOR_*` variables; keys keep their underscores
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            log_filter: "narrator=info".to_string(),
            preferences_dir: None,
            audio_backend: AudioBackend::default(),
        }
    }
}

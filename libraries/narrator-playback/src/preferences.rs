//! Application preferences store
//!
//! A flat JSON object of typed values kept in the per-application config
//! directory. Missing keys read as the type's default.

use crate::error::{PlaybackError, Result};
use directories::ProjectDirs;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Application id used to locate the preferences directory
pub const APP_QUALIFIER: &str = "com";
pub const APP_ORGANIZATION: &str = "example";
pub const APP_NAME: &str = "audiobookplayer";

/// File name inside the config directory
pub const PREFERENCES_FILE: &str = "preferences.json";

/// Key/value preferences persisted as one JSON file
#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
    values: Map<String, Value>,
}

/// Platform config directory for the application
pub fn default_dir() -> Result<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or(PlaybackError::NoConfigDir)
}

impl Preferences {
    /// Load `preferences.json` from `dir`
    ///
    /// A missing file yields an empty store. An unreadable or corrupt file
    /// is logged and also yields an empty store; it is replaced on the next
    /// save.
    pub fn load_from_dir(dir: &Path) -> Self {
        Self::load(dir.join(PREFERENCES_FILE))
    }

    /// Load preferences from an explicit file path
    pub fn load(path: PathBuf) -> Self {
        let values = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Ignoring corrupt preferences: {}", e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to read preferences: {}", e);
                Map::new()
            }
        };

        tracing::debug!(path = %path.display(), keys = values.len(), "Preferences loaded");
        Self { path, values }
    }

    /// Write all values, replacing the file atomically
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let text = serde_json::to_string_pretty(&self.values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), "Preferences saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// String value, `""` if absent or not a string
    pub fn string(&self, key: &str) -> String {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Float value, `0.0` if absent or not a number
    pub fn float(&self, key: &str) -> f64 {
        self.values.get(key).and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// Boolean value, `false` if absent or not a boolean
    pub fn bool(&self, key: &str) -> bool {
        self.values
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_string(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_string(), Value::String(value.to_string()));
    }

    /// Store a float; non-finite values are stored as `0.0`
    pub fn set_float(&mut self, key: &str, value: f64) {
        let number = serde_json::Number::from_f64(value)
            .unwrap_or_else(|| serde_json::Number::from(0));
        self.values.insert(key.to_string(), Value::Number(number));
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), Value::Bool(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::load_from_dir(dir.path());

        assert_eq!(prefs.string("lastFile"), "");
        assert_eq!(prefs.float("lastPosition"), 0.0);
        assert!(!prefs.bool("wasPlaying"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut prefs = Preferences::load_from_dir(dir.path());
        prefs.set_string("lastFile", "file:///books/a.mp3");
        prefs.set_float("lastPosition", 37.5);
        prefs.set_bool("wasPlaying", true);
        prefs.save().unwrap();

        let loaded = Preferences::load_from_dir(dir.path());
        assert_eq!(loaded.string("lastFile"), "file:///books/a.mp3");
        assert_eq!(loaded.float("lastPosition"), 37.5);
        assert!(loaded.bool("wasPlaying"));
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let mut prefs = Preferences::load_from_dir(&nested);
        prefs.set_bool("wasPlaying", true);
        prefs.save().unwrap();

        assert!(nested.join(PREFERENCES_FILE).exists());
        assert!(!nested.join("preferences.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_reads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PREFERENCES_FILE), "{not json").unwrap();

        let prefs = Preferences::load_from_dir(dir.path());
        assert_eq!(prefs.string("lastFile"), "");
    }

    #[test]
    fn test_wrong_type_reads_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PREFERENCES_FILE),
            r#"{"lastPosition": "ten", "wasPlaying": 1}"#,
        )
        .unwrap();

        let prefs = Preferences::load_from_dir(dir.path());
        assert_eq!(prefs.float("lastPosition"), 0.0);
        assert!(!prefs.bool("wasPlaying"));
    }

    #[test]
    fn test_non_finite_float_stored_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut prefs = Preferences::load_from_dir(dir.path());
        prefs.set_float("lastPosition", f64::NAN);
        assert_eq!(prefs.float("lastPosition"), 0.0);
    }
}

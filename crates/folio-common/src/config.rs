use serde::{Deserialize, Serialize};

use std::future::Future;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Directory holding one subdirectory per dataset.
    pub store_dir: PathBuf,
    /// Dataset name; documents live under `store_dir/<dataset>`.
    pub dataset: String,
    /// Quiet period before an auto-save fires, in milliseconds.
    pub autosave_debounce_ms: u64,
    /// Maximum undo steps kept per editor session.
    pub undo_depth: usize,
    /// Document kind used when none is given (`post` or `page`).
    pub default_kind: String,
}

impl Config {
    /// Loads the configuration from the provided loader.
    pub async fn load(loader: &impl Loader) -> Result<Self, ConfigError> {
        loader.load().await
    }

    /// Saves the configuration using the provided saver.
    pub async fn save(&self, saver: &impl Saver) -> Result<(), ConfigError> {
        saver.save(self).await
    }

    /// Overlay environment variables on top of this configuration.
    ///
    /// Optional env vars:
    /// - `FOLIO_STORE_DIR`: store directory
    /// - `FOLIO_DATASET`: dataset name
    /// - `FOLIO_DEBOUNCE_MS`: auto-save debounce in milliseconds
    pub fn with_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(dir) = std::env::var("FOLIO_STORE_DIR") {
            self.store_dir = PathBuf::from(dir);
        }
        if let Ok(dataset) = std::env::var("FOLIO_DATASET") {
            self.dataset = dataset;
        }
        if let Ok(value) = std::env::var("FOLIO_DEBOUNCE_MS") {
            self.autosave_debounce_ms = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "FOLIO_DEBOUNCE_MS",
                value,
            })?;
        }
        Ok(self)
    }

    /// Directory of the configured dataset.
    pub fn dataset_dir(&self) -> Result<PathBuf, ConfigError> {
        let dataset = self.dataset.as_str();
        if dataset.is_empty() || dataset.contains(['/', '\\']) || dataset.contains("..") {
            return Err(ConfigError::InvalidDataset {
                dataset: dataset.to_owned(),
            });
        }
        Ok(self.store_dir.join(dataset))
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}

impl Default for Config {
    /// Creates a new default configuration.
    ///
    /// Auto-save waits two seconds of inactivity, matching the dashboard editor.
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(".folio"),
            dataset: "production".to_owned(),
            autosave_debounce_ms: 2000,
            undo_depth: 100,
            default_kind: "post".to_owned(),
        }
    }
}

/// The trait for loading configuration data.
pub trait Loader {
    /// Loads the configuration data.
    fn load(&self) -> impl Future<Output = Result<Config, ConfigError>> + Send;
}

/// The trait for saving configuration data.
pub trait Saver {
    /// Saves the configuration data.
    fn save(&self, config: &Config) -> impl Future<Output = Result<(), ConfigError>> + Send;
}

/// An implementation of [`Loader`] and [`Saver`] that reads and writes a configuration file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a new [`FileStore`] with the given path.
    ///
    /// [`Config`] data is serialized according to the file extension,
    /// `.json` or `.toml`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read(&self) -> Result<String, ConfigError> {
        std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, contents: String) -> Result<(), ConfigError> {
        std::fs::write(&self.path, contents).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl Loader for FileStore {
    async fn load(&self) -> Result<Config, ConfigError> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&self.read()?)?),
            Some("toml") => Ok(toml::from_str(&self.read()?)?),
            _ => Err(ConfigError::UnsupportedFormat {
                path: self.path.clone(),
            }),
        }
    }
}

impl Saver for FileStore {
    async fn save(&self, config: &Config) -> Result<(), ConfigError> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => self.write(serde_json::to_string_pretty(config)?),
            Some("toml") => self.write(toml::to_string_pretty(config)?),
            _ => Err(ConfigError::UnsupportedFormat {
                path: self.path.clone(),
            }),
        }
    }
}

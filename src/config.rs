//! Store configuration.
//!
//! Every key is optional; a missing file section falls back to the defaults.
//!
//! ```toml
//! modelRoot = "model"
//! allowCompositePrimaryKey = false
//! watch = true
//! debounceMs = 500
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::base::constants::{DEFAULT_DEBOUNCE_MS, DEFAULT_MODEL_ROOT, MODEL_FILE_EXTENSION};
use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Directory scanned for model files.
    pub model_root: PathBuf,
    /// Permit classes with more than one primary-key property.
    pub allow_composite_primary_key: bool,
    /// Keep watching the model root after the initial load.
    pub watch: bool,
    /// Model file extension, without the dot.
    pub extension: String,
    /// Quiescence window before a changed file is reloaded.
    pub debounce_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_root: PathBuf::from(DEFAULT_MODEL_ROOT),
            allow_composite_primary_key: false,
            watch: false,
            extension: MODEL_FILE_EXTENSION.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl ModelConfig {
    pub fn new(model_root: impl Into<PathBuf>) -> Self {
        Self {
            model_root: model_root.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read a TOML config file. Relative `modelRoot` values are taken relative
    /// to the config file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&source)?;
        if config.model_root.is_relative() {
            if let Some(dir) = path.parent() {
                config.model_root = dir.join(&config.model_root);
            }
        }
        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

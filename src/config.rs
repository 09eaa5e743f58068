//! Configuration loaded from `config.toml`.
//!
//! ```toml
//! [render]
//! width = 512
//! margin = 4
//! dark = "#1E40AF"
//! light = "#FFFFFF"
//! ecc = "quartile"
//!
//! [history]
//! limit = 50
//! path = "/tmp/smartqr-history.json"
//! ```
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::history::{DEFAULT_LIMIT, HISTORY_FILE_NAME};
use crate::render::RenderOptions;

const APP_DIR: &str = "smartqr";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub render: RenderOptions,
    pub history: HistoryConfig,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// History file; defaults to the platform data directory.
    pub path: Option<PathBuf>,
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Config {
    /// Parses and validates configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file at `path`. Any failure is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Config::from_toml(&contents)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Loads `path` if given; otherwise the default config file, falling back to defaults
    /// when it is missing or broken.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Config::load_from(path);
        }
        let Some(default_path) = default_config_path() else {
            return Ok(Config::default());
        };
        if !default_path.exists() {
            return Ok(Config::default());
        }
        match Config::load_from(&default_path) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring config file, using defaults");
                Ok(Config::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.render
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        if self.history.limit == 0 {
            return Err(Error::Config("history.limit must be at least 1".into()));
        }
        Ok(())
    }

    /// The history file to use, explicit or platform default.
    pub fn history_path(&self) -> PathBuf {
        self.history
            .path
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR).join(HISTORY_FILE_NAME)))
            .unwrap_or_else(|| PathBuf::from(HISTORY_FILE_NAME))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE_NAME))
}

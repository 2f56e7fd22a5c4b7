//! Configuration
//! JSON settings file with defaults for every field.

use crate::data::DEFAULT_SOURCE_URL;
use crate::stats::{Density, Period};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON in config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_path: PathBuf,
    pub nobel_path: PathBuf,
    pub source_url: String,
    pub output_dir: PathBuf,
    /// Rows kept in top crime type and weapon rankings.
    pub top_n: usize,
    pub period: Period,
    pub density: Density,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/crimes.csv"),
            nobel_path: PathBuf::from("data/nobel.csv"),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            output_dir: PathBuf::from("output"),
            top_n: 10,
            period: Period::Month,
            density: Density::Sparse,
            chart_width: 1000,
            chart_height: 500,
        }
    }
}

impl Config {
    /// Load from `path` if given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".into()));
        }
        if self.chart_width < 200 || self.chart_height < 200 {
            return Err(ConfigError::Invalid(
                "chart dimensions must be at least 200x200".into(),
            ));
        }
        Ok(())
    }
}

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::projection::Viewport;
use crate::sampler::{AltitudeMode, DEFAULT_PERIOD};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid sampling period {value:?}: {reason}")]
    Period { value: String, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
    pub sampler: SamplerConfig,
    pub export: ExportConfig,
    pub viewport: Viewport,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
        }
    }
}

fn default_log_path() -> PathBuf {
    PathBuf::from("gps_data.csv")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SamplerConfig {
    /// Humantime duration, e.g. `2s` or `500ms`.
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub altitude: AltitudeMode,
}

impl SamplerConfig {
    pub fn period(&self) -> Result<Duration, ConfigError> {
        match &self.period {
            Some(value) => parse_period(value),
            None => Ok(DEFAULT_PERIOD),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub directory: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: default_export_dir(),
        }
    }
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("downloads")
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.sampler.period()?;
        Ok(config)
    }
}

pub fn parse_period(value: &str) -> Result<Duration, ConfigError> {
    let err = |reason: String| ConfigError::Period {
        value: value.to_string(),
        reason,
    };
    let period = humantime::parse_duration(value.trim()).map_err(|e| err(e.to_string()))?;
    if period.is_zero() {
        return Err(err("must be greater than zero".into()));
    }
    Ok(period)
}

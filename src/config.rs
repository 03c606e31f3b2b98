// Runtime configuration: optional TOML file, then environment overrides

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::batch::BatchConfig;
use crate::constraints::WordRange;

pub const ENV_LOG_LEVEL: &str = "TENSAKU_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "TENSAKU_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => bail!("Unknown log format '{other}' (expected json or pretty)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    pub fn max_level(&self) -> Result<tracing::Level> {
        self.level
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown log level '{}'", self.level))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Files processed at once; 0 picks the number of CPUs
    pub concurrency: usize,
    pub fail_fast: bool,
}

impl BatchSettings {
    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency == 0 {
            num_cpus::get().max(1)
        } else {
            self.concurrency
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub word_range: WordRange,
    pub required_units: u8,
    pub log: LogConfig,
    pub batch: BatchSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            word_range: WordRange::default(),
            required_units: 2,
            log: LogConfig::default(),
            batch: BatchSettings::default(),
        }
    }
}

impl Config {
    /// Load from an optional TOML file, apply environment overrides, then validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// `lookup` is injected so tests need not touch the process environment
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            debug!("Log level overridden from {}", ENV_LOG_LEVEL);
            self.log.level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.log.format = format.parse()?;
        }
        Ok(())
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            concurrency: self.batch.effective_concurrency(),
            fail_fast: self.batch.fail_fast,
            word_range: self.word_range,
            required_units: self.required_units,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.word_range.min > self.word_range.max {
            bail!(
                "Invalid word range: min ({}) is greater than max ({})",
                self.word_range.min,
                self.word_range.max
            );
        }
        self.log.max_level()?;
        Ok(())
    }
}

// ⚙️ Configuration - TOML bootstrap with built-in defaults
//
// Example patron-registry.toml:
//
//   delimiter = "-"
//
//   [rules]
//   id_length = 7
//   fine_min = 0.0
//   fine_max = 250.0
//
//   [logging]
//   level = "warn"

use crate::error::{RegistryError, Result};
use crate::validation::FieldRules;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_DELIMITER: char = '-';

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Field validation constants
    pub rules: FieldRules,

    /// Separator between the four fields of an import line
    pub delimiter: char,

    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            rules: FieldRules::default(),
            delimiter: DEFAULT_DELIMITER,
            logging: LoggingConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Load and validate a TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RegistryError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: RegistryConfig =
            toml::from_str(content).map_err(|e| RegistryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let rules = &self.rules;

        if rules.id_length == 0 {
            return Err(RegistryError::Config(
                "rules.id_length must be at least 1".to_string(),
            ));
        }
        if !rules.fine_min.is_finite() || !rules.fine_max.is_finite() {
            return Err(RegistryError::Config(
                "fine bounds must be finite numbers".to_string(),
            ));
        }
        if rules.fine_min > rules.fine_max {
            return Err(RegistryError::Config(format!(
                "rules.fine_min ({}) exceeds rules.fine_max ({})",
                rules.fine_min, rules.fine_max
            )));
        }
        if self.delimiter.is_whitespace() || self.delimiter.is_ascii_digit() {
            return Err(RegistryError::Config(format!(
                "delimiter {:?} cannot be whitespace or a digit",
                self.delimiter
            )));
        }

        Ok(())
    }
}

//! Farm configuration, read from `orchard.toml` with environment overrides.

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::harvest_schedule::{HarvestScheduler, DEFAULT_REVISIT_DAYS};

pub const ENV_STRICT_ORDER_COMPLETION: &str = "ORCHARD_STRICT_ORDER_COMPLETION";
pub const ENV_STRICT_REPORT_EDIT: &str = "ORCHARD_STRICT_REPORT_EDIT";
pub const ENV_HARVEST_REVISIT_DAYS: &str = "ORCHARD_HARVEST_REVISIT_DAYS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which ownership checks gate the two contested mutations.
///
/// Strict mode is the default. Permissive mode lets any employee with the
/// right role complete an order or edit a harvest report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OwnershipPolicy {
    pub strict_order_completion: bool,
    pub strict_report_edit: bool,
}

impl Default for OwnershipPolicy {
    fn default() -> Self {
        Self {
            strict_order_completion: true,
            strict_report_edit: true,
        }
    }
}

impl OwnershipPolicy {
    pub fn permissive() -> Self {
        Self {
            strict_order_completion: false,
            strict_report_edit: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Days after a harvest before the tree is due again
    pub revisit_days: u32,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            revisit_days: DEFAULT_REVISIT_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Mailbox size of each table actor
    pub channel_buffer: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self { channel_buffer: 64 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    pub ownership: OwnershipPolicy,
    pub harvest: HarvestConfig,
    pub actors: ActorConfig,
}

impl FarmConfig {
    /// Reads `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `ORCHARD_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps variable names to values.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_STRICT_ORDER_COMPLETION) {
            self.ownership.strict_order_completion = parse_flag(ENV_STRICT_ORDER_COMPLETION, &value)?;
        }
        if let Some(value) = lookup(ENV_STRICT_REPORT_EDIT) {
            self.ownership.strict_report_edit = parse_flag(ENV_STRICT_REPORT_EDIT, &value)?;
        }
        if let Some(value) = lookup(ENV_HARVEST_REVISIT_DAYS) {
            self.harvest.revisit_days = value.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{} must be a number of days, got '{}'", ENV_HARVEST_REVISIT_DAYS, value))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.harvest.revisit_days < 1 {
            return Err(ConfigError::Invalid("harvest.revisit_days must be at least 1".to_string()));
        }
        if self.actors.channel_buffer == 0 {
            return Err(ConfigError::Invalid("actors.channel_buffer must be positive".to_string()));
        }
        Ok(())
    }

    pub fn scheduler(&self) -> HarvestScheduler {
        HarvestScheduler::new(self.harvest.revisit_days)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(format!("{} must be a boolean, got '{}'", key, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_strict_weekly() {
        let config = FarmConfig::default();
        assert!(config.ownership.strict_order_completion);
        assert!(config.ownership.strict_report_edit);
        assert_eq!(config.harvest.revisit_days, 7);
        assert_eq!(config.actors.channel_buffer, 64);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = FarmConfig::from_toml_str(
            r#"
            [ownership]
            strict_order_completion = false

            [harvest]
            revisit_days = 10
            "#,
        )
        .unwrap();
        assert!(!config.ownership.strict_order_completion);
        assert!(config.ownership.strict_report_edit);
        assert_eq!(config.scheduler(), HarvestScheduler::new(10));
        assert_eq!(config.actors.channel_buffer, 64);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            FarmConfig::from_toml_str("[harvest]\nrevisit_days = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            FarmConfig::from_toml_str("[actors]\nchannel_buffer = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            FarmConfig::from_toml_str("[harvest]\nrevisit_days = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_STRICT_REPORT_EDIT, "off"),
            (ENV_HARVEST_REVISIT_DAYS, " 3 "),
        ]);
        let config = FarmConfig::default()
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert!(config.ownership.strict_order_completion);
        assert!(!config.ownership.strict_report_edit);
        assert_eq!(config.harvest.revisit_days, 3);

        let bad = FarmConfig::default().apply_overrides(|key| {
            (key == ENV_STRICT_ORDER_COMPLETION).then(|| "maybe".to_string())
        });
        assert!(matches!(bad, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = FarmConfig::load("/nonexistent/orchard.toml").unwrap();
        assert_eq!(config, FarmConfig::default());
    }
}

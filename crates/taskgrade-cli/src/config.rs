//! Runtime configuration from environment variables.
//!
//! Every variable is optional; unset variables keep the library defaults:
//! - `TASKGRADE_MAX_STEPS`: step limit per run (default: 10000)
//! - `TASKGRADE_MAX_OUTPUT_SIZE`: total emitted weight per run (default: 65536)
//! - `TASKGRADE_MAX_VALUE_SIZE`: weight of any single value (default: 65536)
//! - `TASKGRADE_MAX_VALUE_DEPTH`: nesting of any single value (default: 128)
//! - `TASKGRADE_MAX_COMMANDS`: commands per program (default: 1000)
//! - `TASKGRADE_MAX_DEPTH`: control-flow nesting per program (default: 16)
//! - `TASKGRADE_LOG`: log level written to stderr (default: "warn")

use std::str::FromStr;

use thiserror::Error;
use tracing::Level;

use taskgrade_core::ParseLimits;
use taskgrade_eval::{EvalOptions, Limits};

/// A variable was set to a value that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub limits: Limits,
    pub parse_limits: ParseLimits,
    pub log_level: Level,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            limits: Limits::default(),
            parse_limits: ParseLimits::default(),
            log_level: Level::WARN,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable or `None` when it is unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        if let Some(v) = parsed(&lookup, "TASKGRADE_MAX_STEPS")? {
            config.limits.max_steps = v;
        }
        if let Some(v) = parsed(&lookup, "TASKGRADE_MAX_OUTPUT_SIZE")? {
            config.limits.max_output_size = v;
        }
        if let Some(v) = parsed(&lookup, "TASKGRADE_MAX_VALUE_SIZE")? {
            config.limits.max_value_size = v;
        }
        if let Some(v) = parsed(&lookup, "TASKGRADE_MAX_VALUE_DEPTH")? {
            config.limits.max_value_depth = v;
        }
        if let Some(v) = parsed(&lookup, "TASKGRADE_MAX_COMMANDS")? {
            config.parse_limits.max_commands = v;
        }
        if let Some(v) = parsed(&lookup, "TASKGRADE_MAX_DEPTH")? {
            config.parse_limits.max_depth = v;
        }
        if let Some(v) = parsed(&lookup, "TASKGRADE_LOG")? {
            config.log_level = v;
        }
        Ok(config)
    }

    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            parse_limits: self.parse_limits.clone(),
            limits: self.limits,
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.limits, Limits::default());
        assert_eq!(config.parse_limits, ParseLimits::default());
        assert_eq!(config.log_level, Level::WARN);
    }

    #[test]
    fn reads_every_variable() {
        let config = config_from(&[
            ("TASKGRADE_MAX_STEPS", "50"),
            ("TASKGRADE_MAX_OUTPUT_SIZE", "10"),
            ("TASKGRADE_MAX_VALUE_SIZE", "20"),
            ("TASKGRADE_MAX_VALUE_DEPTH", "8"),
            ("TASKGRADE_MAX_COMMANDS", "5"),
            ("TASKGRADE_MAX_DEPTH", "2"),
            ("TASKGRADE_LOG", "debug"),
        ])
        .unwrap();
        assert_eq!(config.limits.max_steps, 50);
        assert_eq!(config.limits.max_output_size, 10);
        assert_eq!(config.limits.max_value_size, 20);
        assert_eq!(config.limits.max_value_depth, 8);
        assert_eq!(config.parse_limits.max_commands, 5);
        assert_eq!(config.parse_limits.max_depth, 2);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.eval_options().limits.max_steps, 50);
    }

    #[test]
    fn rejects_unparseable_values() {
        assert_eq!(
            config_from(&[("TASKGRADE_MAX_STEPS", "lots")]).unwrap_err(),
            ConfigError::InvalidValue {
                key: "TASKGRADE_MAX_STEPS",
                value: "lots".into()
            }
        );
        assert!(config_from(&[("TASKGRADE_LOG", "loud")]).is_err());
    }
}

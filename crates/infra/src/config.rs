//! Configuration loading and representation.
//!
//! Every setting has a default. A JSON document ([`CommerceConfig::from_json`])
//! may replace any of them, and environment variables override both:
//!
//! | variable                            | field                      | default           |
//! |-------------------------------------|----------------------------|-------------------|
//! | `COMMERCE_NODE_ID`                  | `node_id`                  | `1`               |
//! | `COMMERCE_SNOWFLAKE_EPOCH_MS`       | `epoch_ms`                 | `1704067200000`   |
//! | `COMMERCE_INVENTORY_RETRY_DELAY_MS` | `inventory_retry_delay_ms` | `0`               |
//! | `COMMERCE_LOG`                      | `log_filter`               | `info`            |
//! | `COMMERCE_LOG_JSON`                 | `log_json`                 | `true`            |

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use commerce_core::snowflake::DEFAULT_EPOCH_MS;
use commerce_core::{IdGenerationError, SnowflakeIdGenerator, SystemClock};
use commerce_observability::ObservabilityOptions;
use commerce_products::{Backoff, FixedBackoff, NoBackoff};

pub const NODE_ID_VAR: &str = "COMMERCE_NODE_ID";
pub const EPOCH_MS_VAR: &str = "COMMERCE_SNOWFLAKE_EPOCH_MS";
pub const RETRY_DELAY_MS_VAR: &str = "COMMERCE_INVENTORY_RETRY_DELAY_MS";
pub const LOG_FILTER_VAR: &str = "COMMERCE_LOG";
pub const LOG_JSON_VAR: &str = "COMMERCE_LOG_JSON";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("malformed configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid id generator settings: {0}")]
    IdGenerator(#[from] IdGenerationError),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        "config_error"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommerceConfig {
    /// Snowflake node id, `0..=1023`.
    pub node_id: u16,
    /// Custom Snowflake epoch in Unix milliseconds.
    pub epoch_ms: i64,
    /// Fixed pause between stock-conflict retries; `0` retries immediately.
    pub inventory_retry_delay_ms: u64,
    pub log_filter: String,
    pub log_json: bool,
}

impl Default for CommerceConfig {
    fn default() -> Self {
        Self {
            node_id: 1,
            epoch_ms: DEFAULT_EPOCH_MS,
            inventory_retry_delay_ms: 0,
            log_filter: "info".to_string(),
            log_json: true,
        }
    }
}

impl CommerceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().with_overrides(lookup)
    }

    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// JSON document first, then environment variables on top.
    pub fn load(raw: &str) -> Result<Self, ConfigError> {
        Self::from_json(raw)?.with_overrides(|key| std::env::var(key).ok())
    }

    /// Replace the settings `lookup` knows about, keep the rest.
    pub fn with_overrides<F>(self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = self;
        let config = Self {
            node_id: parse(&lookup, NODE_ID_VAR)?.unwrap_or(defaults.node_id),
            epoch_ms: parse(&lookup, EPOCH_MS_VAR)?.unwrap_or(defaults.epoch_ms),
            inventory_retry_delay_ms: parse(&lookup, RETRY_DELAY_MS_VAR)?
                .unwrap_or(defaults.inventory_retry_delay_ms),
            log_filter: lookup(LOG_FILTER_VAR)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.log_filter),
            log_json: match lookup(LOG_JSON_VAR) {
                Some(raw) => parse_flag(LOG_JSON_VAR, &raw)?,
                None => defaults.log_json,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.epoch_ms < 0 {
            return Err(ConfigError::Invalid {
                key: EPOCH_MS_VAR,
                value: self.epoch_ms.to_string(),
                reason: "epoch must not precede the Unix epoch".to_string(),
            });
        }
        // Node id range is owned by the generator.
        self.id_generator().map(|_| ())
    }

    pub fn id_generator(&self) -> Result<SnowflakeIdGenerator, ConfigError> {
        Ok(SnowflakeIdGenerator::with_clock(
            self.node_id,
            self.epoch_ms,
            SystemClock,
        )?)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.inventory_retry_delay_ms)
    }

    /// Backoff used by the inventory retry facade.
    pub fn backoff(&self) -> Box<dyn Backoff> {
        if self.inventory_retry_delay_ms == 0 {
            Box::new(NoBackoff)
        } else {
            Box::new(FixedBackoff(self.retry_delay()))
        }
    }

    pub fn observability(&self) -> ObservabilityOptions {
        ObservabilityOptions {
            filter: self.log_filter.clone(),
            json: self.log_json,
        }
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

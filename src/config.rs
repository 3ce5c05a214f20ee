use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::notify::telegram;
use crate::providers::finmind;
use crate::sync::SyncConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// FinMind data provider settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinMindConfig {
    #[serde(default = "default_finmind_url")]
    pub api_url: String,

    /// Optional API token; anonymous access has a lower rate limit
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

/// Telegram Bot API settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TelegramConfig {
    #[serde(default = "default_telegram_url")]
    pub api_url: String,

    #[serde(default)]
    pub bot_token: Option<String>,

    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

/// Cron schedules (six fields, seconds first)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// IANA timezone the schedules are evaluated in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Notification cycle schedule
    #[serde(default = "default_stock_spec")]
    pub stock_spec: String,

    /// Catalog sync schedule
    #[serde(default = "default_symbol_sync_spec")]
    pub symbol_sync_spec: String,
}

impl SchedulerConfig {
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        Tz::from_str(&self.timezone).map_err(|_| ConfigError::Invalid {
            key: "SCHEDULER_TIMEZONE",
            value: self.timezone.clone(),
        })
    }
}

/// Process configuration assembled from the environment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_pool_size")]
    pub db_pool_max_size: u32,

    #[serde(default)]
    pub finmind: FinMindConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    /// Deadline for the concurrent startup phase
    #[serde(default = "default_init_timeout")]
    pub init_timeout_secs: u64,

    /// Topics dispatched at the same time in one notification run
    #[serde(default = "default_max_concurrent_topics")]
    pub dispatch_max_concurrent_topics: usize,
}

impl Default for FinMindConfig {
    fn default() -> Self {
        Self {
            api_url: default_finmind_url(),
            token: None,
            timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: default_telegram_url(),
            bot_token: None,
            timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            stock_spec: default_stock_spec(),
            symbol_sync_spec: default_symbol_sync_spec(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            db_pool_max_size: default_pool_size(),
            finmind: FinMindConfig::default(),
            telegram: TelegramConfig::default(),
            scheduler: SchedulerConfig::default(),
            sync: SyncConfig::default(),
            init_timeout_secs: default_init_timeout(),
            dispatch_max_concurrent_topics: default_max_concurrent_topics(),
        }
    }
}

impl AppConfig {
    /// Read configuration from process environment variables
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; unset or empty keys take defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let config = Self {
            database_url: get("DATABASE_URL"),
            db_pool_max_size: parse_or(&get, "DB_POOL_MAX_SIZE", defaults.db_pool_max_size)?,
            finmind: FinMindConfig {
                api_url: get("FINMIND_API_URL").unwrap_or(defaults.finmind.api_url),
                token: get("FINMIND_TOKEN"),
                timeout_secs: parse_or(&get, "FINMIND_TIMEOUT_SECS", defaults.finmind.timeout_secs)?,
            },
            telegram: TelegramConfig {
                api_url: get("TELEGRAM_API_URL").unwrap_or(defaults.telegram.api_url),
                bot_token: get("TELEGRAM_BOT_TOKEN"),
                timeout_secs: parse_or(&get, "TELEGRAM_TIMEOUT_SECS", defaults.telegram.timeout_secs)?,
            },
            scheduler: SchedulerConfig {
                timezone: get("SCHEDULER_TIMEZONE").unwrap_or(defaults.scheduler.timezone),
                stock_spec: get("SCHEDULER_STOCK_SPEC").unwrap_or(defaults.scheduler.stock_spec),
                symbol_sync_spec: get("SYMBOL_SYNC_SPEC").unwrap_or(defaults.scheduler.symbol_sync_spec),
            },
            sync: SyncConfig {
                batch_size: parse_or(&get, "SYNC_BATCH_SIZE", defaults.sync.batch_size)?,
                max_workers: parse_or(&get, "SYNC_MAX_WORKERS", defaults.sync.max_workers)?,
            },
            init_timeout_secs: parse_or(&get, "INIT_TIMEOUT_SECS", defaults.init_timeout_secs)?,
            dispatch_max_concurrent_topics: parse_or(
                &get,
                "DISPATCH_MAX_CONCURRENT_TOPICS",
                defaults.dispatch_max_concurrent_topics,
            )?,
        };

        config.scheduler.tz()?;
        if config.sync.batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "SYNC_BATCH_SIZE",
                value: "0".to_string(),
            });
        }

        Ok(config)
    }

    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url.as_deref().ok_or(ConfigError::Missing("DATABASE_URL"))
    }

    pub fn require_bot_token(&self) -> Result<&str, ConfigError> {
        self.telegram
            .bot_token
            .as_deref()
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

// Default value functions for serde
fn default_finmind_url() -> String {
    finmind::DEFAULT_BASE_URL.to_string()
}

fn default_telegram_url() -> String {
    telegram::DEFAULT_API_URL.to_string()
}

fn default_http_timeout() -> u64 {
    30
}

fn default_timezone() -> String {
    "Asia/Taipei".to_string()
}

fn default_stock_spec() -> String {
    // Weekdays after the Taiwan market close
    "0 0 15 * * Mon-Fri".to_string()
}

fn default_symbol_sync_spec() -> String {
    "0 0 3 * * *".to_string()
}

fn default_pool_size() -> u32 {
    20
}

fn default_init_timeout() -> u64 {
    30
}

fn default_max_concurrent_topics() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.scheduler.stock_spec, "0 0 15 * * Mon-Fri");
        assert_eq!(config.scheduler.tz().unwrap(), chrono_tz::Asia::Taipei);
        assert_eq!(config.sync.batch_size, 100);
        assert_eq!(config.sync.max_workers, 5);
        assert_eq!(config.init_timeout_secs, 30);
        assert_eq!(
            config.require_database_url(),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/stocks"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("SYNC_MAX_WORKERS", "8"),
            ("SCHEDULER_TIMEZONE", "America/New_York"),
            ("FINMIND_TOKEN", "  "),
        ]))
        .unwrap();

        assert_eq!(config.require_database_url().unwrap(), "postgres://localhost/stocks");
        assert_eq!(config.require_bot_token().unwrap(), "123:abc");
        assert_eq!(config.sync.max_workers, 8);
        assert_eq!(config.scheduler.tz().unwrap(), chrono_tz::America::New_York);
        assert!(config.finmind.token.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("SYNC_BATCH_SIZE", "lots")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "SYNC_BATCH_SIZE",
                value: "lots".to_string()
            }
        );

        assert!(AppConfig::from_lookup(lookup(&[("SCHEDULER_TIMEZONE", "Mars/Olympus")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("SYNC_BATCH_SIZE", "0")])).is_err());
    }

    #[test]
    fn test_serde_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"sync": {"batch_size": 50}}"#).unwrap();
        assert_eq!(config.sync.batch_size, 50);
        assert_eq!(config.sync.max_workers, 5);
        assert_eq!(config.scheduler.timezone, "Asia/Taipei");
    }
}

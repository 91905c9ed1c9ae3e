//! Runtime configuration loaded from environment variables.
//!
//! | Variable                   | Default                         |
//! |----------------------------|---------------------------------|
//! | `SCA_DB_PATH`              | `sca.sqlite3`                   |
//! | `SCA_LOG_LEVEL`            | `debug` (debug) / `info`        |
//! | `SCA_LOG_DIR`              | unset: file logging disabled    |
//! | `THECATAPI_BASE_URL`       | `https://api.thecatapi.com/v1`  |
//! | `THECATAPI_KEY`            | unset                           |
//! | `SCA_BREED_CACHE_TTL_SECS` | `600`                           |

use crate::breeds::{DEFAULT_BREED_API_BASE_URL, DEFAULT_BREED_CACHE_TTL};
use crate::logging::{default_log_level, normalize_level, LogSettings};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "sca.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Effective dispatch configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
    pub breed_api_base_url: String,
    pub breed_api_key: Option<String>,
    pub breed_cache_ttl: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level(),
            log_dir: None,
            breed_api_base_url: DEFAULT_BREED_API_BASE_URL.to_string(),
            breed_api_key: None,
            breed_cache_ttl: DEFAULT_BREED_CACHE_TTL,
        }
    }
}

impl DispatchConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = get("SCA_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = get("SCA_LOG_LEVEL") {
            config.log_level = normalize_level(&level).map_err(|reason| {
                ConfigError::InvalidValue {
                    key: "SCA_LOG_LEVEL",
                    value: level.clone(),
                    reason,
                }
            })?;
        }
        config.log_dir = get("SCA_LOG_DIR").map(PathBuf::from);
        if let Some(url) = get("THECATAPI_BASE_URL") {
            config.breed_api_base_url = url;
        }
        config.breed_api_key = get("THECATAPI_KEY");
        if let Some(ttl) = get("SCA_BREED_CACHE_TTL_SECS") {
            let secs = ttl.parse::<u64>().map_err(|err| ConfigError::InvalidValue {
                key: "SCA_BREED_CACHE_TTL_SECS",
                value: ttl.clone(),
                reason: err.to_string(),
            })?;
            config.breed_cache_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Logging settings, present only when a log directory is configured.
    pub fn log_settings(&self, mirror_warnings: bool) -> Option<LogSettings> {
        self.log_dir.as_ref().map(|log_dir| LogSettings {
            level: self.log_level.to_string(),
            log_dir: log_dir.clone(),
            mirror_warnings,
        })
    }
}

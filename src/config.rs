use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::render::DisplaySettings;
use crate::timeline::DEFAULT_TIMELINE_DAYS;

const ENV_PREFIX: &str = "STATUSBOARD_";
const MAX_TIMELINE_DAYS: u32 = 366;
const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub service_name: String,
    pub timeline_days: u32,
    pub utc_offset_minutes: i32,
    pub request_timeout_secs: u64,
    pub bind_address: SocketAddr,
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialConfig {
    api_base_url: Option<String>,
    service_name: Option<String>,
    timeline_days: Option<u32>,
    utc_offset_minutes: Option<i32>,
    request_timeout_secs: Option<u64>,
    bind_address: Option<String>,
    log_dir: Option<String>,
}

fn default_api_base_url() -> String {
    "https://cloud-api.directus.cloud".to_string()
}

fn default_service_name() -> String {
    "Directus Cloud API".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            service_name: default_service_name(),
            timeline_days: DEFAULT_TIMELINE_DAYS,
            utc_offset_minutes: 0,
            request_timeout_secs: 10,
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_dir: default_log_dir(),
        }
    }
}

impl Config {
    /// Defaults, then the optional TOML file, then `STATUSBOARD_*` variables.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::load_with(config_path, std::env::vars())
    }

    /// Same as [`Config::load`] with the given environment variables.
    pub fn load_with<I>(config_path: Option<&Path>, env: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        // 1. Load from file (optional)
        let file_config = match config_path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            _ => PartialConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialConfig = envy::prefixed(ENV_PREFIX)
            .from_iter(env.into_iter().filter(|(_, value)| !value.trim().is_empty()))
            .map_err(|e| ConfigError::Invalid {
                key: "environment",
                reason: e.to_string(),
            })?;

        // 3. Merge: environment overrides file
        let bind_address = env_config
            .bind_address
            .or(file_config.bind_address)
            .unwrap_or_else(default_bind_address);
        let config = Config {
            api_base_url: env_config
                .api_base_url
                .or(file_config.api_base_url)
                .unwrap_or_else(default_api_base_url),
            service_name: env_config
                .service_name
                .or(file_config.service_name)
                .unwrap_or_else(default_service_name),
            timeline_days: env_config
                .timeline_days
                .or(file_config.timeline_days)
                .unwrap_or(DEFAULT_TIMELINE_DAYS),
            utc_offset_minutes: env_config
                .utc_offset_minutes
                .or(file_config.utc_offset_minutes)
                .unwrap_or(0),
            request_timeout_secs: env_config
                .request_timeout_secs
                .or(file_config.request_timeout_secs)
                .unwrap_or(10),
            bind_address: bind_address.parse().map_err(|e| ConfigError::Invalid {
                key: "bind_address",
                reason: format!("'{bind_address}': {e}"),
            })?,
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_TIMELINE_DAYS).contains(&self.timeline_days) {
            return Err(ConfigError::Invalid {
                key: "timeline_days",
                reason: format!("{} is outside 1..={MAX_TIMELINE_DAYS}", self.timeline_days),
            });
        }
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ConfigError::Invalid {
                key: "utc_offset_minutes",
                reason: format!("{} is not within a day of UTC", self.utc_offset_minutes),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Err(e) = reqwest::Url::parse(&self.api_base_url) {
            return Err(ConfigError::Invalid {
                key: "api_base_url",
                reason: format!("'{}': {e}", self.api_base_url),
            });
        }
        Ok(())
    }

    pub fn offset(&self) -> FixedOffset {
        // Range is checked in `validate`.
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn display_settings(&self) -> DisplaySettings {
        DisplaySettings {
            service_name: self.service_name.clone(),
            offset: self.offset(),
            timeline_days: self.timeline_days,
        }
    }
}

//! Configuration loading for the AirSense TUI.
//!
//! All fields are required unless explicitly marked optional. No defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuiConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub refresh_interval_ms: u64,
    pub persistence_path: PathBuf,
    pub log_path: PathBuf,
    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    pub log_filter: Option<String>,
    pub auth: AuthConfig,
    pub paging: PagingConfig,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Fixed bearer token.
    pub token: Option<String>,
    /// File holding the current bearer token, rewritten by the sign-in helper.
    pub token_path: Option<PathBuf>,
    pub refresh_interval_secs: u64,
    /// Sent on API registration; the bearer token itself when absent.
    pub notification_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagingConfig {
    pub environment_page_size: u64,
    pub room_page_size: u64,
    pub member_page_size: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThemeConfig {
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or AIRSENSE_TUI_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl TuiConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: TuiConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(invalid("api_base_url", "must not be empty"));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(invalid("api_base_url", "must be an http(s) URL"));
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms", "must be > 0"));
        }
        if self.refresh_interval_ms == 0 {
            return Err(invalid("refresh_interval_ms", "must be > 0"));
        }
        if self.persistence_path.as_os_str().is_empty() {
            return Err(invalid("persistence_path", "must not be empty"));
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(invalid("log_path", "must not be empty"));
        }
        if let Some(filter) = &self.log_filter {
            if filter.trim().is_empty() {
                return Err(invalid("log_filter", "must not be empty when set"));
            }
        }
        if self.auth.token.is_none() && self.auth.token_path.is_none() {
            return Err(invalid("auth", "token or token_path must be provided"));
        }
        if self.auth.token.is_some() && self.auth.token_path.is_some() {
            return Err(invalid("auth", "token and token_path are mutually exclusive"));
        }
        if self.auth.refresh_interval_secs == 0 {
            return Err(invalid("auth.refresh_interval_secs", "must be > 0"));
        }
        if self.paging.environment_page_size == 0 {
            return Err(invalid("paging.environment_page_size", "must be > 0"));
        }
        if self.paging.room_page_size == 0 {
            return Err(invalid("paging.room_page_size", "must be > 0"));
        }
        if self.paging.member_page_size == 0 {
            return Err(invalid("paging.member_page_size", "must be > 0"));
        }
        if self.theme.name.trim().is_empty() {
            return Err(invalid("theme.name", "must not be empty"));
        }
        if self.theme.name.to_ascii_lowercase() != "airsense" {
            return Err(invalid("theme.name", "only 'airsense' is supported"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("AIRSENSE_TUI_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

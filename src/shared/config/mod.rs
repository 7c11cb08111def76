//! Application configuration module
//!
//! Provides the validated configuration the client is built from. Values can
//! come from the builder, a TOML file, or both (builder calls win).

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the platform API
    pub api_url: Url,
    /// Directory holding the durable credential file
    pub storage_dir: Option<PathBuf>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Optional scheme prefixed to the token in the `Authorization` header
    pub auth_scheme: Option<String>,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// On-disk shape of a config file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    api_url: Option<String>,
    storage_dir: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
    auth_scheme: Option<String>,
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    api_url: Option<String>,
    storage_dir: Option<PathBuf>,
    request_timeout: Option<Duration>,
    auth_scheme: Option<String>,
}

impl AppConfigBuilder {
    /// Set the API base URL
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Use `url` unless an API URL is already set
    pub fn api_url_or(mut self, url: impl Into<String>) -> Self {
        if self.api_url.is_none() {
            self.api_url = Some(url.into());
        }
        self
    }

    /// Set the durable storage directory
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the authorization scheme (e.g. `Bearer`)
    pub fn auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        let scheme = scheme.into();
        self.auth_scheme = if scheme.trim().is_empty() {
            None
        } else {
            Some(scheme.trim().to_string())
        };
        self
    }

    /// Fill unset values from a TOML file
    pub fn merge_file(self, path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.merge_toml(&raw).map_err(|e| match e {
            ConfigError::Parse(message) => ConfigError::File {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Fill unset values from TOML text
    pub fn merge_toml(mut self, raw: &str) -> Result<Self, ConfigError> {
        let file: FileConfig =
            toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;

        if self.api_url.is_none() {
            self.api_url = file.api_url;
        }
        if self.storage_dir.is_none() {
            self.storage_dir = file.storage_dir;
        }
        if self.request_timeout.is_none() {
            self.request_timeout = file.request_timeout_secs.map(Duration::from_secs);
        }
        if self.auth_scheme.is_none() {
            if let Some(scheme) = file.auth_scheme {
                self = self.auth_scheme(scheme);
            }
        }
        Ok(self)
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let raw = self.api_url.ok_or(ConfigError::MissingValue("api_url"))?;
        let api_url = Url::parse(raw.trim()).map_err(|_| ConfigError::InvalidUrl(raw.clone()))?;
        if !matches!(api_url.scheme(), "http" | "https") || api_url.host().is_none() {
            return Err(ConfigError::InvalidUrl(raw));
        }

        Ok(AppConfig {
            api_url,
            storage_dir: self.storage_dir,
            request_timeout: self
                .request_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            auth_scheme: self.auth_scheme,
        })
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid config: {0}")]
    Parse(String),
    #[error("cannot load config file {}: {message}", path.display())]
    File { path: PathBuf, message: String },
}

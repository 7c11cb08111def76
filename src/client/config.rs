use std::path::PathBuf;

use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};

/// Default API URL
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

/// Env var naming the API base URL
pub const ENV_API_URL: &str = "PORTAL_API_URL";
/// Env var naming the durable storage directory
pub const ENV_STORAGE_DIR: &str = "PORTAL_STORAGE_DIR";
/// Env var naming the authorization scheme
pub const ENV_AUTH_SCHEME: &str = "PORTAL_AUTH_SCHEME";
/// Env var naming an optional TOML config file
pub const ENV_CONFIG_FILE: &str = "PORTAL_CONFIG";

/// Directory created under the platform data dir
const APP_DIR: &str = "rehab-portal";

/// Client configuration wrapper.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
}

impl Config {
    /// Build from the process environment, then the optional config file,
    /// then defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Like [`Config::from_env`], with an explicit API URL taking precedence
    pub fn load(api_url: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = AppConfig::builder();
        if let Some(url) = api_url.or_else(|| std::env::var(ENV_API_URL).ok()) {
            builder = builder.api_url(url);
        }
        if let Ok(dir) = std::env::var(ENV_STORAGE_DIR) {
            builder = builder.storage_dir(dir);
        }
        if let Ok(scheme) = std::env::var(ENV_AUTH_SCHEME) {
            builder = builder.auth_scheme(scheme);
        }
        if let Ok(path) = std::env::var(ENV_CONFIG_FILE) {
            builder = builder.merge_file(&PathBuf::from(path))?;
        }
        Self::with_builder(builder)
    }

    /// Build from an explicit builder; a missing API URL falls back to the default.
    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        let app = builder.api_url_or(DEFAULT_API_URL).build()?;
        Ok(Self { app })
    }

    /// Shortcut for tests and tools pointed at one server
    pub fn for_url(url: impl Into<String>) -> Result<Self, ConfigError> {
        Self::with_builder(AppConfig::builder().api_url(url))
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        let base = self.app.api_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// URL for an endpoint built from path segments. Each segment is
    /// percent-encoded, so ids cannot add path levels or a query.
    pub fn endpoint(&self, segments: &[&str]) -> String {
        let mut url = self.app.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.to_string()
    }

    pub fn server_url(&self) -> &str {
        self.app.api_url.as_str()
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self, token: &str) -> String {
        match self.app.auth_scheme.as_deref() {
            Some(scheme) => format!("{} {}", scheme, token),
            None => token.to_string(),
        }
    }

    /// Where the durable credential file lives
    pub fn credentials_path(&self) -> Option<PathBuf> {
        let dir = match &self.app.storage_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()?.join(APP_DIR),
        };
        Some(dir.join("credentials.json"))
    }
}

use crate::error::ConfigError;
use livecanvas_editor::SessionConfig;
use livecanvas_evaluator::Viewport;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "livecanvas.config.json";

/// Overrides `apiBaseUrl` when set
pub const API_BASE_URL_ENV: &str = "LIVECANVAS_API_BASE_URL";

/// LiveCanvas configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Persistence and generation service root
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    #[serde(default = "default_history_quiet_ms")]
    pub history_quiet_ms: u64,

    #[serde(default)]
    pub viewport: Viewport,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_token_env() -> String {
    "LIVECANVAS_TOKEN".to_string()
}

fn default_history_capacity() -> usize {
    50
}

fn default_history_quiet_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Load config from a directory, falling back to defaults when there
    /// is no config file. Environment overrides are applied.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_file(dir)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file(dir: &Path) -> Result<Self, ConfigError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_BASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url;
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            history_capacity: self.history_capacity,
            quiet_period: Duration::from_millis(self.history_quiet_ms),
            viewport: self.viewport,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            token_env: default_token_env(),
            history_capacity: default_history_capacity(),
            history_quiet_ms: default_history_quiet_ms(),
            viewport: Viewport::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

use crate::error::ClientError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_PREFIX: &str = "/api/v1/workflow";
/// The backend runs LLM analysis inline, so requests routinely take tens of seconds.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);

pub const API_URL_ENV_VAR: &str = "HELPDESK_API_URL";

/// Where and how to reach the workflow backend.
///
/// Constructed explicitly and handed to [`crate::HttpWorkflowClient::new`];
/// nothing in this crate reads global configuration on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_prefix: String,
    /// Per-attempt timeout. Retries get a fresh budget.
    pub timeout: Duration,
    /// Additional attempts after the first one fails without a response.
    pub max_retries: u32,
    /// Base backoff; retry `n` waits `retry_backoff * n`.
    pub retry_backoff: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Loads a TOML config file. Every key is optional; missing keys keep
    /// their defaults.
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        let contents = fs::read_to_string(path).map_err(|err| ClientError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let file: ConfigFile = toml::from_str(&contents).map_err(|err| ClientError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Ok(file.into_config())
    }

    /// Applies `HELPDESK_API_URL` on top of whatever was configured.
    pub fn with_env_overrides(self) -> Self {
        self.with_base_url_override(std::env::var(API_URL_ENV_VAR).ok())
    }

    fn with_base_url_override(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|url| !url.trim().is_empty()) {
            self.base_url = url;
        }
        self
    }

    pub fn endpoint_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        let path = path.trim_start_matches('/');
        if prefix.is_empty() {
            format!("{base}/{path}")
        } else {
            format!("{base}/{prefix}/{path}")
        }
    }
}

fn default_user_agent() -> String {
    format!("helpdesk/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    base_url: Option<String>,
    api_prefix: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_backoff_ms: Option<u64>,
    user_agent: Option<String>,
}

impl ConfigFile {
    fn into_config(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            api_prefix: self.api_prefix.unwrap_or(defaults.api_prefix),
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_backoff: self
                .retry_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_backoff),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        }
    }
}

//! Client configuration.
//!
//! `ClientConfig::new` gives usable defaults. `ClientConfig::from_env` reads
//! the same settings from `OPSGATE_*` environment variables.

use std::time::Duration;

use crate::error::{Result, SdkError};

pub const ENV_BASE_URL: &str = "OPSGATE_BASE_URL";
pub const ENV_API_KEY: &str = "OPSGATE_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "OPSGATE_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every request a [`Client`](crate::Client) sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme, host and optional prefix, without a trailing slash.
    pub base_url: String,
    /// Sent as `Authorization: Bearer <key>` when set.
    pub api_key: Option<String>,
    /// Added to every request. Per-call headers override these.
    pub default_headers: Vec<(String, String)>,
    pub user_agent: String,
    /// Applied by the built-in transport. Custom transports may ignore it.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            default_headers: Vec::new(),
            user_agent: format!("opsgate-sdk/{}", env!("CARGO_PKG_VERSION")),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Build a config from `OPSGATE_BASE_URL`, `OPSGATE_API_KEY` and
    /// `OPSGATE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(ENV_BASE_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| SdkError::InvalidConfig(format!("{ENV_BASE_URL} is not set")))?;
        let mut config = Self::new(base_url.trim());

        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
            config.api_key = Some(key.trim().to_string());
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                SdkError::InvalidConfig(format!("{ENV_TIMEOUT_SECS} must be an integer, got {raw:?}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// `None` disables the transport-level timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(SdkError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        Ok(())
    }
}

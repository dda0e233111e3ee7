//! Configuration for the HTTP client
//!
//! Built from the `[http]` section of the workspace configuration, with
//! environment overrides for one-off runs.

use crate::error::{ApiError, ApiResult};
use photopost_core::config::HttpConfig;
use std::env;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Sent on every request; public services such as Nominatim require one
    pub user_agent: String,
    /// Default per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_schema(&HttpConfig::default())
    }
}

impl ClientConfig {
    /// Build from the `[http]` configuration section
    #[must_use]
    pub fn from_schema(http: &HttpConfig) -> Self {
        Self {
            user_agent: http.user_agent.clone(),
            timeout: http.timeout,
        }
    }

    /// Apply `PHOTOPOST_USER_AGENT` and `PHOTOPOST_HTTP_TIMEOUT_SECS` when set
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(agent) = env::var("PHOTOPOST_USER_AGENT") {
            if !agent.trim().is_empty() {
                self.user_agent = agent;
            }
        }
        if let Some(secs) = env::var("PHOTOPOST_HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse::<u64>().ok()) {
            self.timeout = Duration::from_secs(secs);
        }
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.user_agent.trim().is_empty() {
            return Err(ApiError::config("user agent cannot be empty"));
        }
        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }
        Ok(())
    }
}

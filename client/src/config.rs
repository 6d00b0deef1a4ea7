//! Client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// A required configuration field is missing.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A timeout value is out of acceptable range.
    #[error("invalid timeout: {0:?}")]
    InvalidTimeout(Duration),
}

/// Network settings shared by the login and WebSocket halves of the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Whole-request timeout for the login call
    #[serde(default = "default_request_timeout")]
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// TCP connect timeout, also bounding the WebSocket handshake
    #[serde(default = "default_connect_timeout")]
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// How long to wait for the server's close frame after sending ours
    #[serde(default = "default_close_timeout")]
    #[serde(with = "humantime_serde")]
    pub close_timeout: Duration,

    /// User-Agent header sent on login
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_close_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_user_agent() -> String {
    concat!("churn-bench/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            close_timeout: default_close_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the close handshake timeout.
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Set the User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigValidationError::MissingField("user_agent"));
        }

        // 100ms to 5m for request and connect, up to 1m for close
        let floor = Duration::from_millis(100);
        if self.request_timeout < floor || self.request_timeout > Duration::from_secs(300) {
            return Err(ConfigValidationError::InvalidTimeout(self.request_timeout));
        }
        if self.connect_timeout < floor || self.connect_timeout > Duration::from_secs(300) {
            return Err(ConfigValidationError::InvalidTimeout(self.connect_timeout));
        }
        if self.close_timeout < floor || self.close_timeout > Duration::from_secs(60) {
            return Err(ConfigValidationError::InvalidTimeout(self.close_timeout));
        }

        Ok(())
    }
}

//! Scenario configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default size of the shared iteration budget
pub const DEFAULT_ITERATIONS: usize = 1000;

/// Default number of virtual users
pub const DEFAULT_WORKERS: usize = 20;

/// Default global request ceiling
pub const DEFAULT_RATE_PER_SECOND: f64 = 100.0;

/// Password shared by every synthetic user
pub const DEFAULT_PASSWORD: &str = "test";

/// Status the backend answers with when its connection pool is full
pub const DEFAULT_REJECTION_STATUS: u16 = 503;

/// Path of the login endpoint relative to the backend host
pub const LOGIN_PATH: &str = "/v0/auth/login";

/// Path of the WebSocket endpoint relative to the backend host
pub const WEBSOCKET_PATH: &str = "/ws";

/// Scenario configuration
///
/// Describes one churn run: how many iterations in total, how many
/// virtual users share them, the global request ceiling and where the
/// backend lives. Immutable once handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Iterations shared by all workers
    #[serde(default = "default_iterations")]
    pub total_iterations: usize,

    /// Number of concurrent virtual users
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Global ceiling on admitted iterations per second
    #[serde(default = "default_rate")]
    pub rate_per_second: f64,

    /// Requests the limiter lets through back to back
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// HTTP login endpoint
    pub login_url: Url,

    /// WebSocket endpoint
    pub websocket_url: Url,

    /// Password used by every synthetic user
    #[serde(default = "default_password")]
    pub password: String,

    /// Handshake status that means the pool is at capacity
    #[serde(default = "default_rejection_status")]
    pub rejection_status: u16,

    /// Optional wall-clock cap for the whole run (`"90s"`, `"250ms"`)
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_duration: Option<Duration>,
}

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_rate() -> f64 {
    DEFAULT_RATE_PER_SECOND
}

fn default_burst() -> u32 {
    1
}

fn default_password() -> String {
    DEFAULT_PASSWORD.to_string()
}

fn default_rejection_status() -> u16 {
    DEFAULT_REJECTION_STATUS
}

impl ScenarioConfig {
    /// Create a config with default load parameters for the given endpoints
    pub fn new(login_url: Url, websocket_url: Url) -> Self {
        Self {
            total_iterations: DEFAULT_ITERATIONS,
            workers: DEFAULT_WORKERS,
            rate_per_second: DEFAULT_RATE_PER_SECOND,
            burst: default_burst(),
            login_url,
            websocket_url,
            password: default_password(),
            rejection_status: DEFAULT_REJECTION_STATUS,
            max_duration: None,
        }
    }

    /// Derive both endpoints from a backend `host[:port]`
    ///
    /// Login goes to `http://<host>/v0/auth/login`, the socket to
    /// `ws://<host>/ws`.
    pub fn for_backend(host: &str) -> Result<Self, ConfigError> {
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(ConfigError::InvalidEndpoint(
                "backend hostname is empty".into(),
            ));
        }

        let login_url = parse_url(&format!("http://{host}{LOGIN_PATH}"))?;
        let websocket_url = parse_url(&format!("ws://{host}{WEBSOCKET_PATH}"))?;
        Ok(Self::new(login_url, websocket_url))
    }

    /// Set the total iteration budget
    pub fn with_iterations(mut self, total: usize) -> Self {
        self.total_iterations = total;
        self
    }

    /// Set the number of workers
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the global rate ceiling
    pub fn with_rate(mut self, rps: f64) -> Self {
        self.rate_per_second = rps;
        self
    }

    /// Set the limiter burst tolerance
    pub fn with_burst(mut self, burst: u32) -> Self {
        self.burst = burst;
        self
    }

    /// Set the shared password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the status treated as pool-full
    pub fn with_rejection_status(mut self, status: u16) -> Self {
        self.rejection_status = status;
        self
    }

    /// Cap the run at the given duration
    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }

    /// Wall-clock cap, if configured
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_iterations == 0 {
            return Err(ConfigError::InvalidIterations(
                "total iterations must be at least 1".into(),
            ));
        }

        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers(
                "worker count must be at least 1".into(),
            ));
        }

        if !self.rate_per_second.is_finite() || self.rate_per_second <= 0.0 {
            return Err(ConfigError::InvalidRateLimit(format!(
                "rate must be a positive number, got {}",
                self.rate_per_second
            )));
        }

        if self.burst == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "burst must be at least 1".into(),
            ));
        }

        if !matches!(self.login_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint(format!(
                "login url must be http(s): {}",
                self.login_url
            )));
        }

        if !matches!(self.websocket_url.scheme(), "ws" | "wss") {
            return Err(ConfigError::InvalidEndpoint(format!(
                "websocket url must be ws(s): {}",
                self.websocket_url
            )));
        }

        if !(100..=599).contains(&self.rejection_status) || self.rejection_status == 101 {
            return Err(ConfigError::InvalidRejectionStatus(self.rejection_status));
        }

        if self.max_duration.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::InvalidDuration(
                "max duration must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidEndpoint(format!("{raw}: {e}")))
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Iteration budget is unusable
    #[error("Invalid iteration count: {0}")]
    InvalidIterations(String),

    /// Worker count is unusable
    #[error("Invalid worker count: {0}")]
    InvalidWorkers(String),

    /// Rate or burst is unusable
    #[error("Invalid rate limit: {0}")]
    InvalidRateLimit(String),

    /// Endpoint could not be parsed or has the wrong scheme
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Rejection status is not a usable HTTP status
    #[error("Invalid rejection status: {0}")]
    InvalidRejectionStatus(u16),

    /// Max duration is unusable
    #[error("Invalid max duration: {0}")]
    InvalidDuration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> ScenarioConfig {
        ScenarioConfig::for_backend("localhost:8080").unwrap()
    }

    #[test]
    fn test_for_backend_endpoints() {
        let config = local();
        assert_eq!(
            config.login_url.as_str(),
            "http://localhost:8080/v0/auth/login"
        );
        assert_eq!(config.websocket_url.as_str(), "ws://localhost:8080/ws");
    }

    #[test]
    fn test_defaults() {
        let config = local();
        assert_eq!(config.total_iterations, 1000);
        assert_eq!(config.workers, 20);
        assert_eq!(config.rate_per_second, 100.0);
        assert_eq!(config.burst, 1);
        assert_eq!(config.password, "test");
        assert_eq!(config.rejection_status, 503);
        assert!(config.max_duration().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_backend_empty_host() {
        assert!(ScenarioConfig::for_backend("  ").is_err());
    }

    #[test]
    fn test_builder_pattern() {
        let config = local()
            .with_iterations(50)
            .with_workers(5)
            .with_rate(2.5)
            .with_burst(3)
            .with_password("secret")
            .with_rejection_status(429)
            .with_max_duration(Duration::from_secs(30));

        assert_eq!(config.total_iterations, 50);
        assert_eq!(config.workers, 5);
        assert_eq!(config.rate_per_second, 2.5);
        assert_eq!(config.burst, 3);
        assert_eq!(config.password, "secret");
        assert_eq!(config.rejection_status, 429);
        assert_eq!(config.max_duration(), Some(Duration::from_secs(30)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_iterations() {
        let config = local().with_iterations(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidIterations(_))
        ));
    }

    #[test]
    fn test_validation_zero_workers() {
        let config = local().with_workers(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWorkers(_))
        ));
    }

    #[test]
    fn test_validation_bad_rate() {
        for rps in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = local().with_rate(rps);
            assert!(config.validate().is_err(), "rate {rps} should be rejected");
        }
    }

    #[test]
    fn test_validation_zero_burst() {
        assert!(local().with_burst(0).validate().is_err());
    }

    #[test]
    fn test_validation_wrong_schemes() {
        let mut config = local();
        config.websocket_url = Url::parse("http://localhost/ws").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEndpoint(_))
        ));

        let mut config = local();
        config.login_url = Url::parse("ws://localhost/login").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejection_status() {
        assert!(local().with_rejection_status(101).validate().is_err());
        assert!(local().with_rejection_status(42).validate().is_err());
        assert!(local().with_rejection_status(429).validate().is_ok());
    }

    #[test]
    fn test_max_duration_is_kept_exact() {
        let config = local().with_max_duration(Duration::from_millis(250));
        assert_eq!(config.max_duration(), Some(Duration::from_millis(250)));
        assert!(config.validate().is_ok());

        let config = local().with_max_duration(Duration::from_millis(1500));
        assert_eq!(config.max_duration(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_validation_zero_max_duration() {
        assert!(matches!(
            local().with_max_duration(Duration::ZERO).validate(),
            Err(ConfigError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_deserialize_max_duration() {
        let json = r#"{
            "login_url": "http://backend:3000/v0/auth/login",
            "websocket_url": "ws://backend:3000/ws",
            "max_duration": "1m 30s 250ms"
        }"#;
        let config: ScenarioConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_duration(), Some(Duration::from_millis(90_250)));

        let json = serde_json::to_string(&config).unwrap();
        let back: ScenarioConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_duration(), config.max_duration());
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let json = r#"{
            "login_url": "http://backend:3000/v0/auth/login",
            "websocket_url": "ws://backend:3000/ws",
            "workers": 4
        }"#;
        let config: ScenarioConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.workers, 4);
        assert_eq!(config.total_iterations, DEFAULT_ITERATIONS);
        assert_eq!(config.rate_per_second, DEFAULT_RATE_PER_SECOND);
        assert_eq!(config.password, DEFAULT_PASSWORD);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = local().with_iterations(10);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ScenarioConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, config);
        assert!(!json.contains("max_duration"));
    }
}

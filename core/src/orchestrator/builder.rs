//! Builder pattern for Orchestrator construction

use std::sync::Arc;

use crate::config::ScenarioConfig;
use crate::error::{BenchError, BenchResult};
use crate::traits::ProtocolClient;

use super::executor::Orchestrator;

/// Builder for creating an Orchestrator with a validated configuration
///
/// # Example
///
/// ```ignore
/// let orchestrator = OrchestratorBuilder::new()
///     .config(config)
///     .workers(20)
///     .rate_limit(100.0)
///     .client(client)
///     .build()?;
/// ```
pub struct OrchestratorBuilder {
    config: Option<ScenarioConfig>,
    client: Option<Arc<dyn ProtocolClient>>,
    workers: Option<usize>,
    iterations: Option<usize>,
    rate_limit: Option<f64>,
}

impl OrchestratorBuilder {
    /// Create a new orchestrator builder
    pub fn new() -> Self {
        Self {
            config: None,
            client: None,
            workers: None,
            iterations: None,
            rate_limit: None,
        }
    }

    /// Set the full scenario configuration
    pub fn config(mut self, config: ScenarioConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the number of virtual users
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Override the iteration budget
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }

    /// Override the global rate limit (iterations per second)
    pub fn rate_limit(mut self, rps: f64) -> Self {
        self.rate_limit = Some(rps);
        self
    }

    /// Set the protocol client
    pub fn client(mut self, client: Arc<dyn ProtocolClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or client is missing, or if
    /// configuration validation fails.
    pub fn build(self) -> BenchResult<Orchestrator> {
        let mut config = self
            .config
            .ok_or_else(|| BenchError::missing_config("config"))?;
        let client = self
            .client
            .ok_or_else(|| BenchError::missing_config("client"))?;

        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(iterations) = self.iterations {
            config.total_iterations = iterations;
        }
        if let Some(rps) = self.rate_limit {
            config.rate_per_second = rps;
        }

        Orchestrator::new(config, client)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

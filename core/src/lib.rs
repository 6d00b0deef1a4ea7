//! churn-bench-core: Scheduling and accounting for WebSocket pool churn runs
//!
//! This crate holds everything that does not touch the network:
//!
//! - Scenario configuration and validation
//! - The shared iteration pool and global rate limiter
//! - The per-iteration workflow (login, upgrade, classify, close)
//! - Virtual-user workers and the orchestrator that drives them
//! - Outcome counters and check tallies
//!
//! Network access goes through the [`ProtocolClient`] trait, implemented
//! by the `churn-bench-client` crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod outcome;
pub mod pool;
pub mod traits;
pub mod worker;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, ScenarioConfig};
pub use error::*;
pub use metrics::*;
pub use orchestrator::{
    aggregate_worker_stats, AggregatedStats, Orchestrator, OrchestratorBuilder, ScenarioSummary,
};
pub use outcome::{Check, Outcome};
pub use pool::IterationPool;
pub use traits::*;
pub use worker::{RequestRateLimiter, Worker, WorkerBuilder, WorkerStats};
pub use workflow::{AuthFailure, IterationState, IterationWorkflow};

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_outcome_wire_names() {
        assert_eq!(
            serde_json::to_string(&Outcome::Admitted).unwrap(),
            "\"admitted\""
        );
        assert_eq!(
            serde_json::to_string(&Outcome::AuthFailed).unwrap(),
            "\"auth_failed\""
        );
    }

    #[test]
    fn test_snapshot_json_uses_counter_names() {
        let metrics = MetricsAggregator::new();
        metrics.increment(Outcome::Admitted);
        metrics.increment(Outcome::Rejected);
        metrics.increment(Outcome::Rejected);

        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        for outcome in Outcome::ALL {
            assert!(
                json.get(outcome.counter_name()).is_some(),
                "missing {}",
                outcome.counter_name()
            );
        }
        assert_eq!(json["pool_is_full"], 2);
    }

    #[test]
    fn test_config_error_converts_to_bench_error() {
        let err: BenchError = ScenarioConfig::for_backend("localhost")
            .unwrap()
            .with_iterations(0)
            .validate()
            .unwrap_err()
            .into();
        assert_eq!(err.kind, BenchErrorKind::Config);
    }
}

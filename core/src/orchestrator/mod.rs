//! Scenario scheduler
//!
//! The Orchestrator runs one complete churn scenario:
//! - Sets up the shared iteration pool, rate limiter and counters
//! - Spawns one worker per virtual user
//! - Propagates graceful shutdown via a sticky watch flag
//! - Collects worker statistics into a [`ScenarioSummary`]
//!
//! # Example
//!
//! ```ignore
//! use churn_bench_core::{OrchestratorBuilder, ScenarioConfig};
//!
//! let orchestrator = OrchestratorBuilder::new()
//!     .config(ScenarioConfig::for_backend("localhost:8080")?)
//!     .client(client)
//!     .build()?;
//!
//! let summary = orchestrator.run_with_signal_handling().await?;
//! println!("{}", summary.metrics.pool_is_not_full);
//! ```

mod aggregator;
mod builder;
mod executor;

pub use aggregator::{aggregate_worker_stats, AggregatedStats, ScenarioSummary};
pub use builder::OrchestratorBuilder;
pub use executor::Orchestrator;

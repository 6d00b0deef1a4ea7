//! Virtual user workers
//!
//! A Worker plays one virtual user and runs the simple loop
//! **claim -> admit -> iterate -> record -> repeat**:
//!
//! 1. Checks for a shutdown signal
//! 2. Claims one iteration from the shared [`IterationPool`](crate::pool::IterationPool)
//! 3. Waits for the global [`RequestRateLimiter`] to admit it
//! 4. Runs the [`IterationWorkflow`](crate::workflow::IterationWorkflow) to completion
//! 5. Records the outcome in its [`WorkerStats`]
//!
//! Failed or rejected iterations are never retried; each one consumes a
//! budget unit like any other.
//!
//! # Example
//!
//! ```ignore
//! use churn_bench_core::worker::WorkerBuilder;
//!
//! let worker = WorkerBuilder::new(0)
//!     .pool(pool)
//!     .rate_limiter(limiter)
//!     .workflow(workflow)
//!     .build()?;
//!
//! let stats = worker.run(shutdown_rx).await;
//! println!("Admitted: {}", stats.admitted);
//! ```

mod builder;
mod executor;
mod rate_limiter;
mod stats;

pub use builder::WorkerBuilder;
pub use executor::Worker;
pub use rate_limiter::RequestRateLimiter;
pub use stats::WorkerStats;

#[cfg(test)]
mod tests;

//! Builder pattern for Worker construction

use crate::error::{BenchError, BenchResult};
use crate::pool::IterationPool;
use crate::workflow::IterationWorkflow;

use super::executor::Worker;
use super::rate_limiter::RequestRateLimiter;

use std::sync::Arc;

/// Builder for creating Worker instances
///
/// The rate limiter is optional and defaults to unlimited; pool and
/// workflow are required.
///
/// # Example
/// ```ignore
/// let worker = WorkerBuilder::new(0)
///     .pool(pool)
///     .rate_limiter(limiter)
///     .workflow(workflow)
///     .build()?;
/// ```
pub struct WorkerBuilder {
    id: usize,
    pool: Option<Arc<IterationPool>>,
    rate_limiter: Option<Arc<RequestRateLimiter>>,
    workflow: Option<Arc<IterationWorkflow>>,
}

impl WorkerBuilder {
    /// Create a new builder with the given worker ID
    pub fn new(id: usize) -> Self {
        Self {
            id,
            pool: None,
            rate_limiter: None,
            workflow: None,
        }
    }

    /// Set the shared iteration pool
    pub fn pool(mut self, pool: Arc<IterationPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Set the shared rate limiter
    pub fn rate_limiter(mut self, limiter: Arc<RequestRateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Set the iteration workflow
    pub fn workflow(mut self, workflow: Arc<IterationWorkflow>) -> Self {
        self.workflow = Some(workflow);
        self
    }

    /// Build the Worker
    ///
    /// # Errors
    /// Returns an error if the pool or workflow is missing.
    pub fn build(self) -> BenchResult<Worker> {
        let pool = self.pool.ok_or_else(|| BenchError::missing_config("pool"))?;
        let workflow = self
            .workflow
            .ok_or_else(|| BenchError::missing_config("workflow"))?;
        let rate_limiter = self
            .rate_limiter
            .unwrap_or_else(|| Arc::new(RequestRateLimiter::unlimited()));

        Ok(Worker::new(self.id, pool, rate_limiter, workflow))
    }
}

//! Worker execution loop

use crate::pool::IterationPool;
use crate::workflow::IterationWorkflow;

use super::rate_limiter::RequestRateLimiter;
use super::stats::WorkerStats;

use std::sync::Arc;
use tokio::sync::watch;

/// Worker runs iterations in a loop: claim -> admit -> iterate -> record
///
/// Workers are tokio tasks managed by the Orchestrator. They share the
/// iteration pool, the rate limiter and the workflow via Arc; each one
/// plays a single virtual user.
pub struct Worker {
    /// Zero-based worker identifier
    id: usize,

    /// Shared iteration budget
    pool: Arc<IterationPool>,

    /// Global rate limiter
    rate_limiter: Arc<RequestRateLimiter>,

    /// Iteration state machine (shared, stateless)
    workflow: Arc<IterationWorkflow>,
}

impl Worker {
    /// Create a new worker
    pub fn new(
        id: usize,
        pool: Arc<IterationPool>,
        rate_limiter: Arc<RequestRateLimiter>,
        workflow: Arc<IterationWorkflow>,
    ) -> Self {
        Self {
            id,
            pool,
            rate_limiter,
            workflow,
        }
    }

    /// Run the worker loop
    ///
    /// Stops when the pool is exhausted or the shutdown flag is set. The
    /// flag is checked before every claim, so a worker started after it was
    /// raised claims nothing; an iteration that was claimed always runs to
    /// completion and is recorded.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> WorkerStats {
        let mut stats = WorkerStats::new();
        stats.start();

        let user = self.user();
        tracing::debug!(worker_id = self.id, user, "Worker started");

        loop {
            if *shutdown.borrow() {
                tracing::debug!(worker_id = self.id, "Worker received shutdown signal");
                break;
            }

            let Some(ordinal) = self.pool.claim() else {
                tracing::debug!(
                    worker_id = self.id,
                    "No more iterations to claim, worker stopping"
                );
                break;
            };

            self.rate_limiter.admit().await;

            let outcome = self.workflow.run(user).await;
            stats.record(outcome);
            tracing::trace!(worker_id = self.id, ordinal, %outcome, "Iteration finished");
        }

        stats.stop();
        tracing::debug!(
            worker_id = self.id,
            iterations = stats.total_iterations(),
            admitted = stats.admitted,
            rejected = stats.rejected,
            elapsed_ms = ?stats.elapsed().map(|d| d.as_millis()),
            "Worker finished"
        );

        stats
    }

    /// Get the worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// One-based index of the virtual user this worker plays
    pub fn user(&self) -> usize {
        self.id + 1
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("pool", &self.pool)
            .field("rate_limiter", &self.rate_limiter)
            .field("workflow", &self.workflow)
            .finish()
    }
}

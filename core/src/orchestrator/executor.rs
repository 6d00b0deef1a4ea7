//! Orchestrator execution logic

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::watch;

use crate::config::ScenarioConfig;
use crate::error::{BenchError, BenchResult};
use crate::metrics::MetricsAggregator;
use crate::pool::IterationPool;
use crate::traits::ProtocolClient;
use crate::worker::{RequestRateLimiter, WorkerBuilder, WorkerStats};
use crate::workflow::IterationWorkflow;

use super::aggregator::{aggregate_worker_stats, ScenarioSummary};

/// Orchestrator manages the scenario lifecycle
///
/// Responsible for spawning one worker per virtual user, coordinating
/// shutdown and collecting results. The pool it owns is drawn down by a
/// run, so an orchestrator drives a single scenario.
pub struct Orchestrator {
    /// Scenario configuration
    pub(crate) config: ScenarioConfig,

    /// Protocol client (shared across workers)
    pub(crate) client: Arc<dyn ProtocolClient>,

    /// Outcome counters
    pub(crate) metrics: Arc<MetricsAggregator>,

    /// Shared iteration budget
    pub(crate) pool: Arc<IterationPool>,

    /// Global rate limiter
    pub(crate) rate_limiter: Arc<RequestRateLimiter>,

    /// Iteration workflow (shared across workers)
    pub(crate) workflow: Arc<IterationWorkflow>,

    /// Sticky shutdown flag; workers spawned after it is raised see it too
    pub(crate) shutdown_tx: watch::Sender<bool>,

    /// Set by the first run
    pub(crate) started: AtomicBool,
}

impl Orchestrator {
    /// Create a new orchestrator from a validated configuration
    ///
    /// Fails with a config error when `config.validate()` does.
    pub fn new(config: ScenarioConfig, client: Arc<dyn ProtocolClient>) -> BenchResult<Self> {
        config.validate()?;

        let metrics = Arc::new(MetricsAggregator::new());
        let pool = Arc::new(IterationPool::new(config.total_iterations));
        let rate_limiter = Arc::new(RequestRateLimiter::new(
            Some(config.rate_per_second),
            config.burst,
        ));
        let workflow = Arc::new(IterationWorkflow::new(
            Arc::clone(&client),
            Arc::clone(&metrics),
            &config,
        ));
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            client,
            metrics,
            pool,
            rate_limiter,
            workflow,
            shutdown_tx,
            started: AtomicBool::new(false),
        })
    }

    /// Get a shutdown signal receiver
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Ask all workers to stop claiming iterations
    ///
    /// The flag stays raised, so calling this before `run` runs nothing.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Whether shutdown has been requested
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Get the scenario configuration
    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Live outcome counters
    pub fn metrics(&self) -> Arc<MetricsAggregator> {
        Arc::clone(&self.metrics)
    }

    /// Shared iteration pool
    pub fn pool(&self) -> Arc<IterationPool> {
        Arc::clone(&self.pool)
    }

    /// Run the scenario
    ///
    /// Spawns the workers, waits for all of them and returns the final
    /// summary. Honors the configured `max_duration`, if any. The pool is
    /// spent by the first run; calling this again is an error.
    pub async fn run(&self) -> BenchResult<ScenarioSummary> {
        match self.config.max_duration() {
            Some(limit) => self.run_with_timeout(limit).await,
            None => self.execute().await,
        }
    }

    async fn execute(&self) -> BenchResult<ScenarioSummary> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(BenchError::orchestration(
                "scenario already ran; build a new orchestrator",
            ));
        }

        let started_at = Utc::now();
        let start = Instant::now();
        let mut handles = Vec::with_capacity(self.config.workers);

        tracing::info!(
            client = self.client.name(),
            iterations = self.config.total_iterations,
            workers = self.config.workers,
            rate_per_second = self.config.rate_per_second,
            burst = self.config.burst,
            websocket_url = %self.config.websocket_url,
            "Starting scenario"
        );

        for worker_id in 0..self.config.workers {
            let worker = WorkerBuilder::new(worker_id)
                .pool(Arc::clone(&self.pool))
                .rate_limiter(Arc::clone(&self.rate_limiter))
                .workflow(Arc::clone(&self.workflow))
                .build()?;
            let shutdown_rx = self.shutdown_tx.subscribe();

            handles.push(tokio::spawn(worker.run(shutdown_rx)));
        }

        // Wait for all workers to complete
        let mut results: Vec<WorkerStats> = Vec::with_capacity(handles.len());
        let mut worker_failures = 0;
        for (idx, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(stats) => {
                    tracing::debug!(
                        worker_id = idx,
                        iterations = stats.total_iterations(),
                        "Worker completed"
                    );
                    results.push(stats);
                }
                Err(e) => {
                    worker_failures += 1;
                    tracing::error!(worker_id = idx, error = %e, "Worker task panicked");
                }
            }
        }

        if results.is_empty() && worker_failures > 0 {
            return Err(BenchError::orchestration(format!(
                "All {} workers failed to complete",
                worker_failures
            )));
        }

        let aggregated = aggregate_worker_stats(&results);
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            iterations = snapshot.total(),
            pool_is_not_full = snapshot.pool_is_not_full,
            pool_is_full = snapshot.pool_is_full,
            unexpected_response = snapshot.unexpected_response,
            auth_failed = snapshot.auth_failed,
            ips = aggregated.iterations_per_second,
            "Scenario completed"
        );

        if (snapshot.total() as usize) < self.config.total_iterations {
            tracing::warn!(
                completed = snapshot.total(),
                budget = self.config.total_iterations,
                "Scenario stopped before the iteration budget was used"
            );
        }

        Ok(ScenarioSummary {
            started_at,
            finished_at: Utc::now(),
            budget: self.config.total_iterations,
            metrics: snapshot,
            workers: aggregated,
        })
    }

    /// Run with Ctrl+C signal handling
    ///
    /// Ctrl+C stops workers from claiming further iterations; in-flight
    /// iterations finish and are counted.
    pub async fn run_with_signal_handling(&self) -> BenchResult<ScenarioSummary> {
        let shutdown_tx = self.shutdown_tx.clone();

        let signal_handle = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
                    shutdown_tx.send_replace(true);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                }
            }
        });

        let result = self.run().await;

        signal_handle.abort();

        result
    }

    /// Run with a timeout
    ///
    /// Triggers shutdown when the timeout is reached.
    pub async fn run_with_timeout(&self, timeout: Duration) -> BenchResult<ScenarioSummary> {
        let shutdown_tx = self.shutdown_tx.clone();

        let timeout_handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracing::info!("Timeout reached, initiating shutdown...");
            shutdown_tx.send_replace(true);
        });

        let result = self.execute().await;

        timeout_handle.abort();

        result
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("client", &self.client.name())
            .field("rate_limiter", &self.rate_limiter)
            .field("pool", &self.pool)
            .field("shutting_down", &self.is_shutting_down())
            .finish()
    }
}

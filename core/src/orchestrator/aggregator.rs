//! Result aggregation from multiple workers

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metrics::MetricsSnapshot;
use crate::worker::WorkerStats;

/// Aggregated statistics from all workers
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregatedStats {
    /// Number of workers that completed
    pub total_workers: usize,

    /// Iterations admitted
    pub total_admitted: usize,

    /// Iterations rejected
    pub total_rejected: usize,

    /// Iterations with an unexpected result
    pub total_unexpected: usize,

    /// Iterations aborted at login
    pub total_auth_failed: usize,

    /// Maximum duration across all workers
    pub total_duration: Duration,

    /// Overall iterations per second
    pub iterations_per_second: f64,
}

impl AggregatedStats {
    /// Get the total number of iterations
    pub fn total_iterations(&self) -> usize {
        self.total_admitted + self.total_rejected + self.total_unexpected + self.total_auth_failed
    }

    /// Share of iterations admitted (0.0 - 1.0)
    pub fn admission_rate(&self) -> f64 {
        let total = self.total_iterations();
        if total > 0 {
            self.total_admitted as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Aggregate statistics from multiple workers
pub fn aggregate_worker_stats(stats: &[WorkerStats]) -> AggregatedStats {
    if stats.is_empty() {
        return AggregatedStats::default();
    }

    let mut merged = WorkerStats::new();
    for s in stats {
        merged.merge(s);
    }

    // Use the maximum elapsed time across all workers
    let total_duration = stats
        .iter()
        .filter_map(|s| s.elapsed())
        .max()
        .unwrap_or(Duration::ZERO);

    let secs = total_duration.as_secs_f64();
    let iterations_per_second = if secs > 0.0 {
        merged.total_iterations() as f64 / secs
    } else {
        0.0
    };

    AggregatedStats {
        total_workers: stats.len(),
        total_admitted: merged.admitted,
        total_rejected: merged.rejected,
        total_unexpected: merged.unexpected,
        total_auth_failed: merged.auth_failed,
        total_duration,
        iterations_per_second,
    }
}

/// Everything a finished scenario reports
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioSummary {
    /// Wall-clock start
    pub started_at: DateTime<Utc>,

    /// Wall-clock end
    pub finished_at: DateTime<Utc>,

    /// Configured iteration budget
    pub budget: usize,

    /// Final counters
    pub metrics: MetricsSnapshot,

    /// Per-worker totals rolled up
    pub workers: AggregatedStats,
}

impl ScenarioSummary {
    /// Whether every budgeted iteration was run and recorded
    pub fn is_complete(&self) -> bool {
        self.metrics.total() == self.budget as u64
    }
}

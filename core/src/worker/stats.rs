//! Worker statistics tracking

use std::time::Instant;

use crate::outcome::Outcome;

/// Statistics tracked by each worker
#[derive(Debug, Default, Clone)]
pub struct WorkerStats {
    /// Iterations whose handshake was upgraded
    pub admitted: usize,

    /// Iterations turned away with the pool-full status
    pub rejected: usize,

    /// Iterations with any other handshake result
    pub unexpected: usize,

    /// Iterations aborted at login
    pub auth_failed: usize,

    /// Worker start time
    pub started_at: Option<Instant>,

    /// Worker end time
    pub ended_at: Option<Instant>,
}

impl WorkerStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking (records start time)
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Stop tracking (records end time)
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Count one finished iteration
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Admitted => self.admitted += 1,
            Outcome::Rejected => self.rejected += 1,
            Outcome::Unexpected => self.unexpected += 1,
            Outcome::AuthFailed => self.auth_failed += 1,
        }
    }

    /// Count for one outcome
    pub fn count(&self, outcome: Outcome) -> usize {
        match outcome {
            Outcome::Admitted => self.admitted,
            Outcome::Rejected => self.rejected,
            Outcome::Unexpected => self.unexpected,
            Outcome::AuthFailed => self.auth_failed,
        }
    }

    /// Iterations run by this worker
    pub fn total_iterations(&self) -> usize {
        self.admitted + self.rejected + self.unexpected + self.auth_failed
    }

    /// Share of iterations that were admitted (0.0 - 1.0)
    pub fn admission_rate(&self) -> f64 {
        if self.total_iterations() == 0 {
            0.0
        } else {
            self.admitted as f64 / self.total_iterations() as f64
        }
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.started_at.map(|start| {
            self.ended_at
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }

    /// Iterations per second
    pub fn iterations_per_second(&self) -> f64 {
        self.elapsed()
            .map(|d| {
                let secs = d.as_secs_f64();
                if secs > 0.0 {
                    self.total_iterations() as f64 / secs
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0)
    }

    /// Merge stats from another worker
    pub fn merge(&mut self, other: &WorkerStats) {
        self.admitted += other.admitted;
        self.rejected += other.rejected;
        self.unexpected += other.unexpected;
        self.auth_failed += other.auth_failed;
    }
}

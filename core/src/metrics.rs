//! Outcome counters and check tallies shared by all workers

use crate::outcome::{Check, Outcome};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide metrics for one scenario run
///
/// Every operation is a single atomic increment or load, so workers can
/// record concurrently without coordination. Counts never decrease.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    outcomes: [AtomicU64; 4],
    check_passes: [AtomicU64; 2],
    check_fails: [AtomicU64; 2],
}

impl MetricsAggregator {
    /// Create an aggregator with every counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one iteration with the given outcome
    pub fn increment(&self, outcome: Outcome) {
        self.outcomes[outcome.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Record the result of a check
    pub fn record_check(&self, check: Check, passed: bool) {
        let tally = if passed {
            &self.check_passes
        } else {
            &self.check_fails
        };
        tally[check.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Current count for one outcome
    pub fn count(&self, outcome: Outcome) -> u64 {
        self.outcomes[outcome.index()].load(Ordering::Relaxed)
    }

    /// Iterations recorded so far, across all outcomes
    pub fn total(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    /// Point-in-time copy of all counters
    ///
    /// Exact once every worker has finished; while workers are running
    /// each counter is individually accurate but they may be skewed
    /// relative to each other.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let checks = Check::ALL
            .iter()
            .map(|check| CheckTally {
                check: *check,
                name: check.name().to_string(),
                passes: self.check_passes[check.index()].load(Ordering::Relaxed),
                fails: self.check_fails[check.index()].load(Ordering::Relaxed),
            })
            .collect();

        MetricsSnapshot {
            pool_is_not_full: self.count(Outcome::Admitted),
            pool_is_full: self.count(Outcome::Rejected),
            unexpected_response: self.count(Outcome::Unexpected),
            auth_failed: self.count(Outcome::AuthFailed),
            checks,
        }
    }
}

/// Pass/fail tally of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckTally {
    /// Which check
    pub check: Check,
    /// Display name
    pub name: String,
    /// Times it held
    pub passes: u64,
    /// Times it did not
    pub fails: u64,
}

impl CheckTally {
    /// Total evaluations
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    /// Fraction of evaluations that passed (0.0 - 1.0)
    pub fn pass_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.passes as f64 / self.total() as f64
        }
    }
}

/// Final (or in-flight) counter values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Admitted iterations
    pub pool_is_not_full: u64,
    /// Rejected iterations
    pub pool_is_full: u64,
    /// Unexpected iterations
    pub unexpected_response: u64,
    /// Iterations aborted at login
    pub auth_failed: u64,
    /// Check tallies
    pub checks: Vec<CheckTally>,
}

impl MetricsSnapshot {
    /// Count for one outcome
    pub fn count(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Admitted => self.pool_is_not_full,
            Outcome::Rejected => self.pool_is_full,
            Outcome::Unexpected => self.unexpected_response,
            Outcome::AuthFailed => self.auth_failed,
        }
    }

    /// Sum over all outcomes
    pub fn total(&self) -> u64 {
        Outcome::ALL.iter().map(|o| self.count(*o)).sum()
    }

    /// `(counter name, value)` pairs in reporting order
    pub fn counters(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        Outcome::ALL
            .iter()
            .map(move |o| (o.counter_name(), self.count(*o)))
    }

    /// Tally for one check
    pub fn check(&self, check: Check) -> Option<&CheckTally> {
        self.checks.iter().find(|t| t.check == check)
    }
}

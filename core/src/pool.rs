//! Shared iteration budget drawn down by all workers

use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed budget of iterations shared by every virtual user
///
/// Claims are a compare-and-swap on the remaining count, so the total
/// number of successful claims is exactly the configured budget no matter
/// how many workers race for it. The count never goes below zero.
#[derive(Debug)]
pub struct IterationPool {
    total: usize,
    remaining: AtomicUsize,
}

impl IterationPool {
    /// Create a pool holding `total` iterations
    pub fn new(total: usize) -> Self {
        Self {
            total,
            remaining: AtomicUsize::new(total),
        }
    }

    /// Try to take one iteration
    ///
    /// Returns the zero-based ordinal of the claimed iteration, or `None`
    /// once the budget is exhausted. Never blocks.
    pub fn claim(&self) -> Option<usize> {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .ok()
            .map(|previous| self.total - previous)
    }

    /// Iterations not yet claimed
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Iterations claimed so far
    pub fn claimed(&self) -> usize {
        self.total - self.remaining()
    }

    /// Configured budget
    pub fn total(&self) -> usize {
        self.total
    }

    /// Whether no claims are left
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

//! Global request-rate ceiling shared by all workers

use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

/// Rate limiter using the GCRA token bucket from the governor crate
///
/// One instance is shared by every worker through an `Arc`, so the
/// ceiling applies to the aggregate request rate. Callers that cannot be
/// admitted yet are delayed, never turned away.
pub struct RequestRateLimiter {
    limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    rate_limit: Option<f64>,
    burst: u32,
}

impl RequestRateLimiter {
    /// Create a rate limiter
    ///
    /// # Arguments
    /// * `rate_limit` - Requests per second. `None` or a non-positive value
    ///   disables limiting.
    /// * `burst` - Requests admitted back to back before pacing kicks in
    ///   (clamped to at least 1).
    ///
    /// Fractional rates are honoured: `Some(0.5)` admits one request every
    /// two seconds.
    ///
    /// # Examples
    /// ```
    /// use churn_bench_core::worker::RequestRateLimiter;
    ///
    /// let limiter = RequestRateLimiter::new(Some(100.0), 1);
    /// assert!(limiter.is_enabled());
    ///
    /// let unlimited = RequestRateLimiter::new(None, 1);
    /// assert!(!unlimited.is_enabled());
    /// ```
    pub fn new(rate_limit: Option<f64>, burst: u32) -> Self {
        let burst = burst.max(1);
        let limiter = rate_limit.and_then(|rps| {
            if !rps.is_finite() || rps <= 0.0 {
                return None;
            }
            // Rates beyond nanosecond resolution collapse to a zero period,
            // which governor rejects; those run unlimited.
            let period = Duration::try_from_secs_f64(1.0 / rps).ok()?;
            let quota = Quota::with_period(period)?.allow_burst(NonZeroU32::new(burst)?);
            Some(RateLimiter::direct(quota))
        });

        Self {
            limiter,
            rate_limit,
            burst,
        }
    }

    /// Create an unlimited rate limiter
    pub fn unlimited() -> Self {
        Self::new(None, 1)
    }

    /// Wait until a request is admitted
    ///
    /// Returns immediately if no rate limit is configured.
    pub async fn admit(&self) {
        if let Some(ref limiter) = self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Try to acquire a permit without waiting
    ///
    /// Always returns `true` if no rate limit is configured.
    pub fn try_acquire(&self) -> bool {
        match &self.limiter {
            Some(limiter) => limiter.check().is_ok(),
            None => true,
        }
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Configured rate limit (requests per second)
    pub fn rate_limit(&self) -> Option<f64> {
        self.rate_limit
    }

    /// Configured burst tolerance
    pub fn burst(&self) -> u32 {
        self.burst
    }
}

impl Default for RequestRateLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl std::fmt::Debug for RequestRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRateLimiter")
            .field("rate_limit", &self.rate_limit)
            .field("burst", &self.burst)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

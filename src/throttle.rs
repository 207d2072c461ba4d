//! Request throttle
//!
//! A fixed-cadence permit source shared by every task of a walk. Each outbound
//! fetch waits for one permit; permits are handed out one period apart and at
//! most one permit is available immediately after an idle stretch.

use crate::error::ConfigError;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

/// Fixed-cadence rate limiter
pub struct RateLimiter {
    period: Duration,
    /// Earliest instant the next permit may be handed out
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Cadence used when neither the URI nor the config file sets one
    pub const DEFAULT_PERMITS_PER_SECOND: f64 = 5.0;

    /// Create a limiter issuing `permits_per_second` permits
    pub fn new(permits_per_second: f64) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidParameter {
            name: "rate".to_string(),
            value: permits_per_second.to_string(),
            reason: reason.to_string(),
        };
        if !permits_per_second.is_finite() || permits_per_second <= 0.0 {
            return Err(invalid("must be a positive number of permits per second"));
        }
        let period = Duration::try_from_secs_f64(1.0 / permits_per_second)
            .map_err(|_| invalid("too small, the period between permits is out of range"))?;
        if Instant::now().checked_add(period).is_none() {
            return Err(invalid("too small, the period between permits is out of range"));
        }
        Ok(Self::with_period(period))
    }

    /// Create a limiter with an explicit spacing between permits.
    ///
    /// A zero period disables throttling.
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            next_slot: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next permit.
    ///
    /// Never fails; the only effect is the delay. The slot is reserved before
    /// sleeping, so concurrent callers queue up one period apart.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock();
            let now = Instant::now();
            let slot = match *next {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next = Some(slot + self.period);
            slot
        };

        let wait = slot.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            trace!(wait_ms = wait.as_millis() as u64, "Waiting for permit");
            sleep_until(slot).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_period(Duration::from_millis(200))
    }
}

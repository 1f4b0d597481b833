//! Rate limiter for profile updates.
//!
//! Keeps bio updates at least `min_interval` apart, even when the rotation
//! interval is shorter or the bot was restarted mid-interval, and honours
//! flood waits reported by Telegram.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Rate limiter that enforces minimum intervals between operations.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum duration between allowed operations.
    min_interval: Duration,

    /// Earliest time the next operation may run.
    next_allowed: Mutex<Option<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_allowed: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Waits until an operation is allowed, then marks the operation as performed.
    ///
    /// Returns the duration waited (0 if no wait was needed).
    pub async fn wait_and_acquire(&self) -> Duration {
        let mut next = self.next_allowed.lock().await;

        let wait_duration = next.map_or(Duration::ZERO, |at| {
            at.saturating_duration_since(Instant::now())
        });

        if !wait_duration.is_zero() {
            debug!("Rate limiter: waiting {:?} before next operation", wait_duration);
            tokio::time::sleep(wait_duration).await;
        }

        *next = Some(Instant::now() + self.min_interval);
        wait_duration
    }

    /// Pushes the next allowed operation at least `wait` into the future.
    pub async fn hold_off(&self, wait: Duration) {
        let mut next = self.next_allowed.lock().await;
        let until = Instant::now() + wait;
        if next.is_none_or(|at| at < until) {
            *next = Some(until);
        }
    }

    /// Time remaining until the next operation is allowed.
    #[cfg(test)]
    async fn time_until_allowed(&self) -> Duration {
        self.next_allowed
            .lock()
            .await
            .map_or(Duration::ZERO, |at| at.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_operation_is_immediate() {
        let limiter = RateLimiter::from_secs(60);
        assert_eq!(limiter.wait_and_acquire().await, Duration::ZERO);
        assert_eq!(limiter.time_until_allowed().await, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_operation_waits_remaining_interval() {
        let limiter = RateLimiter::from_secs(60);
        limiter.wait_and_acquire().await;

        tokio::time::sleep(Duration::from_secs(20)).await;

        assert_eq!(limiter.wait_and_acquire().await, Duration::from_secs(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hold_off_extends_but_never_shortens() {
        let limiter = RateLimiter::from_secs(60);
        limiter.wait_and_acquire().await;

        limiter.hold_off(Duration::from_secs(10)).await;
        assert_eq!(limiter.time_until_allowed().await, Duration::from_secs(60));

        limiter.hold_off(Duration::from_secs(300)).await;
        assert_eq!(limiter.time_until_allowed().await, Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hold_off_already_served() {
        let limiter = RateLimiter::from_secs(60);
        limiter.hold_off(Duration::from_secs(30)).await;

        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(limiter.wait_and_acquire().await, Duration::ZERO);
    }
}

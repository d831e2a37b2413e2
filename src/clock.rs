//! Clock Abstraction
//!
//! The governor never calls `tokio::time` directly; it goes through the
//! [`Clock`] trait so tests can substitute a controlled clock. The default
//! [`SystemClock`] delegates to tokio, which also means tests running under
//! tokio's paused clock (`#[tokio::test(start_paused = true)]`) get
//! deterministic, auto-advancing time for free.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Source of time and delays for the admission governor.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn system_clock_sleep_advances_paused_time() {
        let clock = SystemClock;
        let before = clock.now();
        clock.sleep(Duration::from_secs(30)).await;
        let elapsed = clock.now().duration_since(before);
        assert!(elapsed >= Duration::from_secs(30));
    }
}

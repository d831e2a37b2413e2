//! Sliding Rate Window
//!
//! Bookkeeping for the rolling requests-per-minute ceiling. [`RateWindow`] is
//! a pure state machine over instants: it owns no timer and never sleeps, so
//! the admission rule can be unit tested with constructed instants. The
//! governor supplies `now` and performs the actual waiting.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Padding added past the oldest entry's expiry so a woken caller lands
/// strictly outside the window instead of racing its edge.
const WAIT_PAD: Duration = Duration::from_millis(200);

/// Floor on any computed wait.
const MIN_WAIT: Duration = Duration::from_millis(1_000);

/// Outcome of a rate-window admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A rate slot was taken; the caller may execute now.
    Admitted,
    /// The window is full; retry after the given wait.
    RetryAfter(Duration),
}

/// Trailing-window admission counter.
///
/// Holds the start instant of each admission within the trailing window,
/// ordered by insertion. Entries at or past the window's age are pruned
/// lazily on each admission attempt.
#[derive(Debug)]
pub struct RateWindow {
    window: Duration,
    max_admissions: usize,
    starts: VecDeque<Instant>,
}

impl RateWindow {
    /// Create an empty window allowing `max_admissions` per `window`.
    pub fn new(max_admissions: usize, window: Duration) -> Self {
        Self {
            window,
            max_admissions,
            starts: VecDeque::with_capacity(max_admissions),
        }
    }

    /// Attempt to take a rate slot at `now`.
    ///
    /// Prunes expired entries first. If a slot is free, `now` is recorded and
    /// the caller is admitted; otherwise the returned wait is the time until
    /// the oldest entry leaves the window, padded by [`WAIT_PAD`] and clamped
    /// to `MIN_WAIT..=window`.
    pub fn try_admit(&mut self, now: Instant) -> Admission {
        while self
            .starts
            .front()
            .is_some_and(|start| now.duration_since(*start) >= self.window)
        {
            self.starts.pop_front();
        }

        if self.starts.len() < self.max_admissions {
            self.starts.push_back(now);
            return Admission::Admitted;
        }

        let wait = match self.starts.front() {
            Some(oldest) => {
                let elapsed = now.duration_since(*oldest);
                self.window.saturating_sub(elapsed) + WAIT_PAD
            }
            // max_admissions == 0: nothing to expire, wait a full window.
            None => self.window,
        };
        Admission::RetryAfter(wait.min(self.window).max(MIN_WAIT))
    }

    /// Number of recorded admissions, including any not yet pruned.
    pub fn admitted(&self) -> usize {
        self.starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn window() -> RateWindow {
        RateWindow::new(5, Duration::from_secs(60))
    }

    #[test]
    fn admits_up_to_limit_instantly() {
        let mut w = window();
        let now = Instant::now();
        for _ in 0..5 {
            assert_eq!(w.try_admit(now), Admission::Admitted);
        }
        assert_eq!(w.admitted(), 5);
    }

    #[test]
    fn sixth_caller_waits_past_oldest_expiry() {
        let mut w = window();
        let t0 = Instant::now();
        for i in 0..5 {
            w.try_admit(t0 + Duration::from_secs(i));
        }

        // At t=10s the oldest entry (t=0) expires at t=60s.
        let now = t0 + Duration::from_secs(10);
        match w.try_admit(now) {
            Admission::RetryAfter(wait) => {
                assert_eq!(wait, Duration::from_millis(50_200));
            }
            Admission::Admitted => panic!("window full, caller must wait"),
        }
    }

    #[test]
    fn wait_is_floored_at_one_second() {
        let mut w = window();
        let t0 = Instant::now();
        for _ in 0..5 {
            w.try_admit(t0);
        }

        // 100ms before expiry the raw wait (100ms + pad) is under the floor.
        let now = t0 + Duration::from_millis(59_900);
        match w.try_admit(now) {
            Admission::RetryAfter(wait) => assert_eq!(wait, MIN_WAIT),
            Admission::Admitted => panic!("window full, caller must wait"),
        }
    }

    #[test]
    fn wait_is_capped_at_window_length() {
        let mut w = RateWindow::new(0, Duration::from_secs(60));
        match w.try_admit(Instant::now()) {
            Admission::RetryAfter(wait) => assert_eq!(wait, Duration::from_secs(60)),
            Admission::Admitted => panic!("zero-slot window never admits"),
        }
    }

    #[test]
    fn expired_entries_are_pruned() {
        let mut w = window();
        let t0 = Instant::now();
        for _ in 0..5 {
            assert_eq!(w.try_admit(t0), Admission::Admitted);
        }

        // Exactly window + 1ms later every entry has aged out.
        let later = t0 + Duration::from_millis(60_001);
        assert_eq!(w.try_admit(later), Admission::Admitted);
        assert_eq!(w.admitted(), 1);
    }

    #[test]
    fn entry_aged_exactly_one_window_is_expired() {
        let mut w = RateWindow::new(1, Duration::from_secs(60));
        let t0 = Instant::now();
        assert_eq!(w.try_admit(t0), Admission::Admitted);
        assert_eq!(
            w.try_admit(t0 + Duration::from_secs(60)),
            Admission::Admitted
        );
    }

    proptest! {
        /// No admission schedule can hold more than `max` live entries.
        #[test]
        fn never_exceeds_max_within_window(offsets_ms in prop::collection::vec(0u64..120_000, 1..64)) {
            let mut w = window();
            let t0 = Instant::now();
            let mut offsets = offsets_ms.clone();
            offsets.sort_unstable();

            for off in offsets {
                w.try_admit(t0 + Duration::from_millis(off));
                prop_assert!(w.admitted() <= 5);
            }
        }
    }
}

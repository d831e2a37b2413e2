//! Admission Governor
//!
//! Sits between request handlers and an outbound call to a rate-limited
//! generation provider. Every governed call passes two independent gates
//! before it executes:
//!
//! 1. a concurrency ceiling, with a strict-FIFO queue of waiting callers;
//! 2. a sliding rate window capping admissions per rolling minute.
//!
//! A call that fails with a quota error (see [`classify`]) is retried exactly
//! once after a fixed cooldown; every other error propagates unmodified.
//!
//! The governor is an explicitly constructed value meant to be shared via
//! `Arc` and injected wherever admission control is needed; there is no
//! global instance. All shared bookkeeping sits behind one mutex, which is
//! never held across an await point.
//!
//! There is no cancellation primitive: a queued caller stays queued until a
//! slot frees. If a caller's future is dropped mid-run its concurrency slot
//! is reclaimed by a drop guard, but no timeout is applied.

use anyhow::Result;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::classify::{classify, ErrorClass};
use super::config::GovernorConfig;
use super::stats::{AdmissionLog, AdmissionRecord, CallOutcome, GovernorStats};
use super::window::{Admission, RateWindow};
use crate::clock::{Clock, SystemClock};

/// Bookkeeping serialized behind the state mutex.
struct GovernorState {
    /// Callers holding a concurrency slot, from gate pass to release.
    /// Counting slot holders rather than only executing callers is what
    /// keeps the ceiling tight while admitted callers wait on the window.
    in_flight: u32,
    window: RateWindow,
    wait_queue: VecDeque<oneshot::Sender<()>>,
    log: AdmissionLog,
}

struct Shared {
    config: GovernorConfig,
    state: Mutex<GovernorState>,
    total_admitted: AtomicU64,
    total_quota_retries: AtomicU64,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, GovernorState> {
        self.state.lock().unwrap()
    }
}

/// Admission control for calls to a rate-limited generation provider.
pub struct AdmissionGovernor {
    shared: Arc<Shared>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AdmissionGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionGovernor")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl AdmissionGovernor {
    /// Create a governor running on the system clock.
    pub fn new(config: GovernorConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a governor with default limits.
    pub fn default_config() -> Self {
        Self::new(GovernorConfig::default())
    }

    /// Create a governor driven by the given clock (for tests).
    pub fn with_clock(config: GovernorConfig, clock: Arc<dyn Clock>) -> Self {
        let window = RateWindow::new(config.max_per_minute, config.window());
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(GovernorState {
                    in_flight: 0,
                    window,
                    wait_queue: VecDeque::new(),
                    log: AdmissionLog::default(),
                }),
                total_admitted: AtomicU64::new(0),
                total_quota_retries: AtomicU64::new(0),
            }),
            clock,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &GovernorConfig {
        &self.shared.config
    }

    /// Run `task` under admission control.
    ///
    /// The task is a thunk so the governor can invoke it a second time after
    /// a quota error; it is called at most twice. The returned value or error
    /// is the task's own, never synthesized by the governor.
    pub async fn run<T, F, Fut>(&self, mut task: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.shared.config.enabled {
            let (result, _) = self.execute(&mut task).await;
            return result;
        }

        let entered = self.clock.now();
        let slot = self.acquire_slot().await;
        self.acquire_rate_slot().await;
        let queued_for = self.clock.now().duration_since(entered);
        self.shared.total_admitted.fetch_add(1, Ordering::Relaxed);

        let (result, outcome) = self.execute(&mut task).await;
        self.shared.lock().log.record(outcome, queued_for);
        drop(slot);
        result
    }

    /// Stats snapshot for dashboards.
    pub fn snapshot(&self) -> GovernorStats {
        let state = self.shared.lock();
        GovernorStats {
            in_flight: state.in_flight,
            queued: state.wait_queue.len(),
            admitted_in_window: state.window.admitted(),
            total_admitted: self.shared.total_admitted.load(Ordering::Relaxed),
            total_quota_retries: self.shared.total_quota_retries.load(Ordering::Relaxed),
        }
    }

    /// Retained history of governed calls, oldest first.
    pub fn recent_calls(&self) -> Vec<AdmissionRecord> {
        self.shared.lock().log.records()
    }

    /// Take a concurrency slot, queueing FIFO behind the ceiling.
    async fn acquire_slot(&self) -> SlotGuard {
        let waiter = {
            let mut state = self.shared.lock();
            if state.in_flight < self.shared.config.max_concurrent {
                state.in_flight += 1;
                None
            } else {
                let (tx, rx) = oneshot::channel();
                state.wait_queue.push_back(tx);
                Some(rx)
            }
        };

        match waiter {
            None => SlotGuard {
                shared: Arc::clone(&self.shared),
            },
            Some(rx) => {
                debug!(
                    max_concurrent = self.shared.config.max_concurrent,
                    "concurrency ceiling reached, queueing caller"
                );
                let mut pending = PendingSlot {
                    shared: Arc::clone(&self.shared),
                    rx,
                    armed: true,
                };
                // A sender is only ever consumed by a grant while the shared
                // state is alive, so this resolves with the slot transferred.
                let _ = (&mut pending.rx).await;
                pending.armed = false;
                SlotGuard {
                    shared: Arc::clone(&pending.shared),
                }
            }
        }
    }

    /// Loop until the rate window admits this caller.
    async fn acquire_rate_slot(&self) {
        loop {
            let wait = {
                let mut state = self.shared.lock();
                let now = self.clock.now();
                match state.window.try_admit(now) {
                    Admission::Admitted => None,
                    Admission::RetryAfter(wait) => Some(wait),
                }
            };
            match wait {
                None => return,
                Some(wait) => {
                    debug!(wait_ms = wait.as_millis() as u64, "rate window full, waiting");
                    self.clock.sleep(wait).await;
                }
            }
        }
    }

    /// Invoke the task, retrying once after the cooldown on a quota error.
    async fn execute<T, F, Fut>(&self, task: &mut F) -> (Result<T>, CallOutcome)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match task().await {
            Ok(value) => (Ok(value), CallOutcome::Succeeded),
            Err(error) if classify(&error) == ErrorClass::Quota => {
                let cooldown = self.shared.config.retry_after();
                warn!(
                    error = %error,
                    cooldown_ms = cooldown.as_millis() as u64,
                    "provider reported quota exhaustion, retrying once after cooldown"
                );
                self.shared.total_quota_retries.fetch_add(1, Ordering::Relaxed);
                self.clock.sleep(cooldown).await;
                match task().await {
                    Ok(value) => (Ok(value), CallOutcome::SucceededAfterRetry),
                    Err(retry_error) => (Err(retry_error), CallOutcome::FailedAfterRetry),
                }
            }
            Err(error) => (Err(error), CallOutcome::Failed),
        }
    }
}

/// Releases the concurrency slot and hands it to the next FIFO waiter.
struct SlotGuard {
    shared: Arc<Shared>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        // Release must happen even if a holder panicked and poisoned the lock.
        let mut state = match self.shared.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.in_flight -= 1;
        while state.in_flight < self.shared.config.max_concurrent {
            match state.wait_queue.pop_front() {
                Some(tx) => {
                    // Transfer the slot before signalling so the woken caller
                    // never races a fresh arrival for it. A failed send means
                    // the waiter gave up; move on to the next one.
                    if tx.send(()).is_ok() {
                        state.in_flight += 1;
                        break;
                    }
                }
                None => break,
            }
        }
    }
}

/// Reclaims a granted slot if a queued caller's future is dropped between
/// the grant arriving and the caller resuming.
struct PendingSlot {
    shared: Arc<Shared>,
    rx: oneshot::Receiver<()>,
    armed: bool,
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        if self.armed && self.rx.try_recv().is_ok() {
            drop(SlotGuard {
                shared: Arc::clone(&self.shared),
            });
        }
    }
}

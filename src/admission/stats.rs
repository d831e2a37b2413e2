//! Usage Accounting
//!
//! Point-in-time stats snapshots plus a bounded history of governed calls,
//! for the admin panel and for debugging quota pressure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// How many call records the in-memory history keeps.
pub const DEFAULT_LOG_CAPACITY: usize = 1_000;

/// Point-in-time view of a governor's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorStats {
    /// Callers currently holding a concurrency slot
    pub in_flight: u32,

    /// Callers waiting for a concurrency slot
    pub queued: usize,

    /// Admissions recorded in the current rate window
    pub admitted_in_window: usize,

    /// Total admissions since the governor was created
    pub total_admitted: u64,

    /// Total quota-error retries since the governor was created
    pub total_quota_retries: u64,
}

/// How a governed call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutcome {
    /// First invocation succeeded
    Succeeded,
    /// First invocation hit a quota error, the retry succeeded
    SucceededAfterRetry,
    /// Failed with a non-quota error, no retry
    Failed,
    /// Quota error, and the retry failed too
    FailedAfterRetry,
}

/// Record of one governed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionRecord {
    /// When the call finished
    pub timestamp: DateTime<Utc>,

    /// How the call ended
    pub outcome: CallOutcome,

    /// Time spent waiting for admission (concurrency slot + rate window)
    pub queued_for: Duration,
}

/// Bounded in-memory history of governed calls.
#[derive(Debug)]
pub struct AdmissionLog {
    capacity: usize,
    records: VecDeque<AdmissionRecord>,
}

impl AdmissionLog {
    /// Create a log keeping at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: VecDeque::new(),
        }
    }

    /// Append a record, evicting the oldest if the log is full.
    pub fn record(&mut self, outcome: CallOutcome, queued_for: Duration) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(AdmissionRecord {
            timestamp: Utc::now(),
            outcome,
            queued_for,
        });
    }

    /// All retained records, oldest first.
    pub fn records(&self) -> Vec<AdmissionRecord> {
        self.records.iter().cloned().collect()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for AdmissionLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

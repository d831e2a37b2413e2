//! Admission Control Module
//!
//! This module governs calls to rate-limited generation providers with a
//! concurrency ceiling, a sliding requests-per-minute window, and a single
//! delayed retry on quota errors.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    Governor Registry                      │
//! │        (one governor per upstream quota pool)             │
//! ├──────────────────────────────────────────────────────────┤
//! │                   Admission Governor                      │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────┐   │
//! │  │ Concurrency  │→ │ Rate Window  │→ │ Execute with  │   │
//! │  │ gate (FIFO)  │  │ (5 / 60 s)   │  │ 1 quota retry │   │
//! │  └──────────────┘  └──────────────┘  └───────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod classify;
pub mod config;
pub mod governor;
pub mod registry;
pub mod stats;
pub mod window;

pub use classify::{classify, ErrorClass};
pub use config::GovernorConfig;
pub use governor::AdmissionGovernor;
pub use registry::{GovernorRegistry, ProviderKind};
pub use stats::{AdmissionRecord, CallOutcome, GovernorStats};
pub use window::{Admission, RateWindow};

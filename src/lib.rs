//! OmniLearn Governor Library
//!
//! Admission control for the OmniLearnAI backend's calls to rate-limited
//! generative-AI providers: a concurrency ceiling, a sliding per-minute rate
//! window, a single delayed retry on quota errors, and normalization of
//! provider errors into user-facing responses.

pub mod admission;
pub mod clock;
pub mod fault;

pub use admission::{AdmissionGovernor, GovernorConfig, GovernorRegistry, ProviderKind};
pub use clock::{Clock, SystemClock};
pub use fault::ProviderFault;

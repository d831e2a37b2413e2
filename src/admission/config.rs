//! Governor Configuration
//!
//! Limits for the admission governor. Defaults match the free-tier quota of
//! the generation providers the backend talks to: 3 concurrent calls, 5 calls
//! per rolling minute, and a 65 second cooldown before the single retry on a
//! quota error.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Max simultaneous executions.
pub const DEFAULT_MAX_CONCURRENT: u32 = 3;
/// Max admissions per rolling window.
pub const DEFAULT_MAX_PER_MINUTE: usize = 5;
/// Rate window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);
/// Delay before the single retry on a quota error.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_millis(65_000);

/// Admission governor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Enable admission control
    pub enabled: bool,

    /// Maximum simultaneous executions
    pub max_concurrent: u32,

    /// Maximum admissions per rolling window
    pub max_per_minute: usize,

    /// Rate window length in milliseconds
    pub window_ms: u64,

    /// Delay in milliseconds before the single retry on a quota error
    pub retry_after_ms: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_per_minute: DEFAULT_MAX_PER_MINUTE,
            window_ms: DEFAULT_WINDOW.as_millis() as u64,
            retry_after_ms: DEFAULT_RETRY_AFTER.as_millis() as u64,
        }
    }
}

impl GovernorConfig {
    /// Create a configuration with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("OMNILEARN_GOVERNOR_ENABLED") {
            config.enabled = val.parse().unwrap_or(true);
        }

        // A zero ceiling would park every caller forever; keep the default.
        if let Ok(val) = std::env::var("OMNILEARN_GOVERNOR_MAX_CONCURRENT") {
            if let Ok(limit) = val.parse() {
                if limit > 0 {
                    config.max_concurrent = limit;
                }
            }
        }

        if let Ok(val) = std::env::var("OMNILEARN_GOVERNOR_MAX_PER_MINUTE") {
            if let Ok(limit) = val.parse() {
                if limit > 0 {
                    config.max_per_minute = limit;
                }
            }
        }

        if let Ok(val) = std::env::var("OMNILEARN_GOVERNOR_WINDOW_MS") {
            if let Ok(ms) = val.parse() {
                config.window_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("OMNILEARN_GOVERNOR_RETRY_AFTER_MS") {
            if let Ok(ms) = val.parse() {
                config.retry_after_ms = ms;
            }
        }

        config
    }

    /// Rate window length
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Cooldown before the single quota retry
    pub fn retry_after(&self) -> Duration {
        Duration::from_millis(self.retry_after_ms)
    }

    /// Disable admission control (for testing)
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

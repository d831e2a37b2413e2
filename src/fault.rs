//! Provider Fault Normalization
//!
//! Raw provider errors are developer-facing. Route handlers call
//! [`ProviderFault::of`] to turn them into a stable, user-facing message and
//! HTTP status. Log the raw error before normalizing; the mapping is lossy
//! on purpose.

use anyhow::Error;
use thiserror::Error as ThisError;

/// User-facing classification of a failed generation call.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ProviderFault {
    /// The server is missing the provider API key
    #[error("Missing API key: add the provider key to the server environment and restart.")]
    MissingApiKey,

    /// The upstream request quota is exhausted
    #[error("Generation quota exceeded. Requests are limited per minute; try again shortly.")]
    QuotaExceeded,

    /// The requested model is unavailable or was retired
    #[error("Generation model not available. Please try again later.")]
    ModelUnavailable,

    /// Anything else; the raw message is passed through
    #[error("{0}")]
    Other(String),
}

impl ProviderFault {
    /// Normalize a raw provider error.
    ///
    /// Precedence mirrors how the faults overlap in practice: a bad key often
    /// surfaces as a quota-looking message, so the key check runs first.
    pub fn of(error: &Error) -> Self {
        let raw = error.to_string();
        let chain = error
            .chain()
            .map(|cause| cause.to_string().to_lowercase())
            .collect::<Vec<_>>()
            .join(": ");

        if chain.contains("api key") || chain.contains("api_key") {
            return ProviderFault::MissingApiKey;
        }
        if chain.contains("quota")
            || chain.contains("429")
            || chain.contains("resource exhausted")
            || chain.contains("rate limit")
        {
            return ProviderFault::QuotaExceeded;
        }
        if chain.contains("not found") || chain.contains("404") || chain.contains("model") {
            return ProviderFault::ModelUnavailable;
        }

        ProviderFault::Other(raw)
    }

    /// HTTP status a route handler should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            ProviderFault::MissingApiKey
            | ProviderFault::QuotaExceeded
            | ProviderFault::ModelUnavailable => 503,
            ProviderFault::Other(_) => 500,
        }
    }
}

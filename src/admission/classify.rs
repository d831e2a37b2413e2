//! Quota Error Classification
//!
//! Generation providers signal quota exhaustion through error text rather
//! than a structured code, so the governor matches on the message. The rule
//! lives here, in one place, instead of being repeated at call sites.

use anyhow::Error;

/// Classification of a failed provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The provider rejected the call for exceeding its request quota;
    /// eligible for the governor's single delayed retry.
    Quota,
    /// Any other failure; surfaced to the caller unmodified, never retried.
    Other,
}

/// Substrings (lowercased) that mark a provider error as a quota violation.
const QUOTA_MARKERS: [&str; 4] = ["quota", "429", "resource exhausted", "rate limit"];

/// Classify a provider error by its message.
///
/// Walks the whole error chain: callers wrap provider errors with context,
/// and the quota marker usually sits on the root cause.
pub fn classify(error: &Error) -> ErrorClass {
    let is_quota = error.chain().any(|cause| {
        let msg = cause.to_string().to_lowercase();
        QUOTA_MARKERS.iter().any(|marker| msg.contains(marker))
    });
    if is_quota {
        ErrorClass::Quota
    } else {
        ErrorClass::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn quota_markers_classify_as_quota() {
        for msg in [
            "Quota exceeded for quota metric",
            "HTTP 429 Too Many Requests",
            "RESOURCE EXHAUSTED: try again later",
            "provider rate limit hit",
        ] {
            assert_eq!(classify(&anyhow!("{msg}")), ErrorClass::Quota, "{msg}");
        }
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify(&anyhow!("QUOTA exceeded")), ErrorClass::Quota);
        assert_eq!(classify(&anyhow!("Rate Limit reached")), ErrorClass::Quota);
    }

    #[test]
    fn other_errors_are_not_quota() {
        for msg in ["invalid topic", "connection refused", "500 internal error"] {
            assert_eq!(classify(&anyhow!("{msg}")), ErrorClass::Other, "{msg}");
        }
    }

    #[test]
    fn classifies_through_error_context() {
        let err = anyhow!("429 too many requests").context("diagram generation failed");
        assert_eq!(classify(&err), ErrorClass::Quota);
    }
}

//! Error types
//!
//! `Error` is the crate-seam error every library crate converts into.
//! `TierFailure` is the per-tier outcome the orchestrator matches on to pick
//! the next fallback tier; it never reaches the shopper.

use std::time::Duration;
use thiserror::Error;

/// Result alias using the core error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error taxonomy
#[derive(Error, Debug)]
pub enum Error {
    /// Missing credentials or invalid service configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout, 5xx or malformed payload from an upstream service
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Stored data could not be read back
    #[error("Data error: {0}")]
    Data(String),

    /// Inbound request rejected before entering the pipeline
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Retrieval error: {0}")]
    Rag(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl Error {
    /// Whether the error must be surfaced to the caller as a 4xx rejection
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Why a single fallback tier did not produce a result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TierFailure {
    /// Tier is not configured (no credentials, no webhook, disabled)
    #[error("tier not configured: {0}")]
    NotConfigured(String),

    /// Tier exceeded its time budget
    #[error("tier timed out after {0:?}")]
    Timeout(Duration),

    /// Upstream answered with an error status or could not be reached
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Upstream answered but the payload was unusable
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Tier ran but produced nothing usable
    #[error("tier produced no results")]
    Empty,
}

impl TierFailure {
    /// Short label used for metrics and logs
    pub fn label(&self) -> &'static str {
        match self {
            TierFailure::NotConfigured(_) => "not_configured",
            TierFailure::Timeout(_) => "timeout",
            TierFailure::Upstream(_) => "upstream",
            TierFailure::Malformed(_) => "malformed",
            TierFailure::Empty => "empty",
        }
    }
}

impl From<TierFailure> for Error {
    fn from(failure: TierFailure) -> Self {
        match failure {
            TierFailure::NotConfigured(msg) => Error::Configuration(msg),
            other => Error::Upstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_failure_labels() {
        assert_eq!(TierFailure::Timeout(Duration::from_secs(1)).label(), "timeout");
        assert_eq!(TierFailure::Empty.label(), "empty");
    }

    #[test]
    fn test_not_configured_maps_to_configuration_error() {
        let err: Error = TierFailure::NotConfigured("no webhook".into()).into();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(!err.is_validation());
    }
}

//! Caller-visible errors for the review engine
//!
//! Only failures the caller must act on surface here. Detector failures and
//! fix conflicts are absorbed inside the pipeline and reported on the
//! [`Review`](crate::models::Review) instead.

use crate::models::Finding;
use thiserror::Error;

/// Errors that can be returned by [`run_review`](crate::run_review)
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Submission is {size} bytes, which exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// The run exceeded its time budget. `partial_findings` holds what fully
    /// completed detectors had committed; no review is produced from them.
    #[error("Review timed out after {elapsed_ms}ms ({} findings from completed detectors discarded)", .partial_findings.len())]
    Timeout {
        elapsed_ms: u64,
        partial_findings: Vec<Finding>,
    },

    #[error("Review was cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to start detector worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReviewError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether the caller may retry with a larger budget
    pub fn is_timeout(&self) -> bool {
        matches!(self, ReviewError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_message() {
        let err = ReviewError::PayloadTooLarge { size: 2_000_000, limit: 1_048_576 };
        assert_eq!(
            err.to_string(),
            "Submission is 2000000 bytes, which exceeds the 1048576 byte limit"
        );
    }

    #[test]
    fn test_timeout_message_counts_partials() {
        let err = ReviewError::Timeout { elapsed_ms: 12, partial_findings: vec![] };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("0 findings"));
    }
}

//! Error types for the openness-scoring library.
//!
//! Structured errors via thiserror. Classifier "no verdict" outcomes are
//! never errors; only configuration problems, missing inputs and genuine
//! I/O failures surface here.

use thiserror::Error;

/// Main error type for scoring and sniffing operations.
#[derive(Debug, Error)]
pub enum QaError {
    /// Score-table configuration errors (fatal, load time only)
    #[error("invalid score configuration: {0}")]
    ScoreConfig(String),

    /// A resource id that is not part of the dataset being scored
    #[error("resource not found: {0}")]
    MissingResource(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for scoring operations
pub type Result<T> = std::result::Result<T, QaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QaError::ScoreConfig("duplicate entry \"CSV\"".to_string());
        assert_eq!(
            err.to_string(),
            "invalid score configuration: duplicate entry \"CSV\""
        );

        let err = QaError::MissingResource("abc-123".to_string());
        assert_eq!(err.to_string(), "resource not found: abc-123");
    }
}

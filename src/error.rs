//! Error types for the keyword sentiment library

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// A source table or keyword reference could not be loaded
    #[error("failed to load '{artifact}': {reason}")]
    InputLoad { artifact: String, reason: String },

    /// A chunk could not be scored by the classifier or polarity oracle
    #[error("scoring failed: {0}")]
    Scoring(String),

    /// Transient classifier backend failure, safe to retry
    #[error("classifier backend error: {0}")]
    Inference(String),

    /// The weighting join produced no rows
    #[error(
        "no keyword rows of '{artifact}' matched the reference list; \
         weighted score is undefined"
    )]
    JoinMismatch { artifact: String },

    /// An output artifact could not be written to storage
    #[error("failed to persist '{artifact}': {reason}")]
    Persist { artifact: String, reason: String },

    /// Transient object storage failure, safe to retry
    #[error("storage request failed: {0}")]
    Storage(String),

    /// The remote API rejected the request
    #[error("api error: {0}")]
    Api(String),

    /// The requested object does not exist
    #[error("object not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded
    #[error("rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimit { retry_after_secs: u64 },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// CSV encode/decode error
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::RateLimit { .. } | Error::Network(_) | Error::Storage(_) | Error::Inference(_)
        )
    }

    /// Get suggested retry delay in seconds
    pub fn retry_delay(&self) -> Option<u64> {
        match self {
            Error::RateLimit { retry_after_secs } => Some(*retry_after_secs),
            Error::Network(_) | Error::Storage(_) | Error::Inference(_) => Some(5),
            _ => None,
        }
    }

    /// Shorthand for input-load failures
    pub fn input_load(artifact: &str, reason: impl ToString) -> Self {
        Error::InputLoad {
            artifact: artifact.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for persist failures
    pub fn persist(artifact: &str, reason: impl ToString) -> Self {
        Error::Persist {
            artifact: artifact.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        let err = Error::RateLimit {
            retry_after_secs: 30,
        };
        assert!(err.is_retryable());
        assert_eq!(err.retry_delay(), Some(30));

        let err = Error::Storage("503 backend unavailable".to_string());
        assert!(err.is_retryable());

        let err = Error::Inference("classifier endpoint returned 502 Bad Gateway".to_string());
        assert!(err.is_retryable());
        assert_eq!(err.retry_delay(), Some(5));
        assert!(err.to_string().starts_with("classifier backend error"));
    }

    #[test]
    fn test_non_retryable_errors() {
        let err = Error::Config("missing bucket name".to_string());
        assert!(!err.is_retryable());
        assert_eq!(err.retry_delay(), None);

        let err = Error::JoinMismatch {
            artifact: "output_q1.csv".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = Error::input_load("keywords.csv", "no such key");
        assert_eq!(
            err.to_string(),
            "failed to load 'keywords.csv': no such key"
        );

        let err = Error::JoinMismatch {
            artifact: "output_q1.csv".to_string(),
        };
        assert!(err.to_string().contains("output_q1.csv"));
        assert!(err.to_string().contains("reference list"));
    }
}

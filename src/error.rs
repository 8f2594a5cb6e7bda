//! Error types for sluice
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::scheduler::RouteKey;

/// All error types that can surface from the scheduler
#[derive(Debug, Error)]
pub enum SluiceError {
    /// A route's pending queue was full at submission time
    #[error("queue for route {key} is full (capacity {capacity})")]
    Backpressure { key: RouteKey, capacity: usize },

    /// Non-2xx response that is not worth retrying
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Transport-level failure from the HTTP client
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The retry bound was exceeded; carries the final transient cause
    #[error("gave up after {attempts} retries")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<SluiceError>,
    },

    /// The request body cannot be cloned, so the call could not be retried
    #[error("request body cannot be cloned for retries")]
    UnclonableRequest,

    /// The scheduler dropped the request without settling it
    #[error("request was abandoned by the scheduler")]
    Abandoned,
}

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, SluiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backpressure_error() {
        let err = SluiceError::Backpressure {
            key: RouteKey::new("match-v1"),
            capacity: 1024,
        };
        assert_eq!(err.to_string(), "queue for route match-v1 is full (capacity 1024)");
    }

    #[test]
    fn test_status_error() {
        let err = SluiceError::Status {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "server returned 404: not found");
    }

    #[test]
    fn test_retries_exhausted_carries_cause() {
        let cause = SluiceError::Status {
            status: 503,
            body: String::new(),
        };
        let err = SluiceError::RetriesExhausted {
            attempts: 10,
            source: Box::new(cause),
        };
        assert_eq!(err.to_string(), "gave up after 10 retries");

        let source = std::error::Error::source(&err).expect("source should be set");
        assert!(source.to_string().contains("503"));
    }

    #[test]
    fn test_transport_error_conversion() {
        // "http://" has no host, so building the request fails synchronously
        let reqwest_err = reqwest::Client::new().get("http://").build().unwrap_err();
        let err: SluiceError = reqwest_err.into();
        assert!(matches!(err, SluiceError::Transport(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(SluiceError::Abandoned)
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}

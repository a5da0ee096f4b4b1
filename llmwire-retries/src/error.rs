//! Retry error types.

use std::time::Duration;
use thiserror::Error;

/// Substrings in an error message that mark it as transient.
const TRANSIENT_MARKERS: &[&str] = &[
    "rate limit",
    "rate_limit",
    "connection",
    "timeout",
    "timed out",
    "network",
];

/// A single failed attempt.
#[derive(Debug, Error)]
pub enum RetryableError {
    /// HTTP error with status code.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
        /// Retry-After header value.
        retry_after: Option<Duration>,
    },

    /// Timeout.
    #[error("Request timeout")]
    Timeout,

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Other error.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl RetryableError {
    /// Create an HTTP error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
            retry_after: None,
        }
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an error from a message.
    pub fn message(msg: impl std::fmt::Display) -> Self {
        Self::Other(anyhow::anyhow!("{msg}"))
    }

    /// Get the suggested retry-after duration.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Http { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Whether another attempt could succeed.
    ///
    /// HTTP 429 and 5xx, timeouts and connection failures are transient, as
    /// is any other error whose message mentions a rate limit, connection,
    /// timeout or network problem.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::Timeout | Self::Connection(_) => true,
            Self::Other(err) => has_transient_marker(&err.to_string()),
        }
    }

    /// Get the HTTP status if this is an HTTP error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn has_transient_marker(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Terminal outcome of a retried operation.
#[derive(Debug, Error)]
pub enum RetryError {
    /// Every allowed attempt failed with a transient error.
    #[error("request failed after {attempts} attempts: {last_error}")]
    Exhausted {
        /// Attempts made, including the first.
        attempts: u32,
        /// Message of the last failure.
        last_error: String,
        /// The last failure.
        #[source]
        source: RetryableError,
    },

    /// The failure was not transient and was not retried.
    #[error(transparent)]
    Permanent(RetryableError),
}

impl RetryError {
    /// The underlying attempt error.
    pub fn last(&self) -> &RetryableError {
        match self {
            Self::Exhausted { source, .. } => source,
            Self::Permanent(err) => err,
        }
    }

    /// HTTP status of the last attempt, if any.
    pub fn status(&self) -> Option<u16> {
        self.last().status()
    }
}

/// Result type for a single attempt.
pub type RetryResult<T> = Result<T, RetryableError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RetryableError::http(429, "slow down"), true)]
    #[case(RetryableError::http(500, "boom"), true)]
    #[case(RetryableError::http(503, "unavailable"), true)]
    #[case(RetryableError::http(400, "bad request"), false)]
    #[case(RetryableError::http(401, "unauthorized"), false)]
    #[case(RetryableError::Timeout, true)]
    #[case(RetryableError::connection("reset by peer"), true)]
    #[case(RetryableError::message("Rate limit reached for model"), true)]
    #[case(RetryableError::message("operation timed out"), true)]
    #[case(RetryableError::message("Network unreachable"), true)]
    #[case(RetryableError::message("invalid model name"), false)]
    fn test_classification(#[case] error: RetryableError, #[case] retryable: bool) {
        assert_eq!(error.is_retryable(), retryable);
    }

    #[test]
    fn test_exhausted_message() {
        let err = RetryError::Exhausted {
            attempts: 4,
            last_error: "HTTP error 500: boom".to_string(),
            source: RetryableError::http(500, "boom"),
        };
        assert_eq!(
            err.to_string(),
            "request failed after 4 attempts: HTTP error 500: boom"
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_permanent_is_transparent() {
        let err = RetryError::Permanent(RetryableError::http(400, "bad"));
        assert_eq!(err.to_string(), "HTTP error 400: bad");
    }
}

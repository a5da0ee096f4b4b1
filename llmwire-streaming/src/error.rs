//! Streaming errors.

use thiserror::Error;

/// Errors that can occur while decoding a response stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The SSE line buffer grew past its limit. Fatal for the stream.
    #[error("SSE buffer overflow: {size} bytes exceeds limit of {limit}")]
    BufferOverflow {
        /// Buffered bytes at the time of the overflow.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// Parse error for an SSE event.
    #[error("Failed to parse SSE event: {0}")]
    ParseSse(String),

    /// JSON parse error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading from the connection failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The provider reported an error inside the stream.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Reconnection attempts ran out.
    #[error("stream failed after {attempts} attempts: {message}")]
    RetriesExhausted {
        /// Reconnection attempts made.
        attempts: u32,
        /// Last error message.
        message: String,
    },

    /// Stream was cancelled by the caller.
    #[error("Stream cancelled")]
    Cancelled,

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl StreamError {
    /// Whether reconnecting could help.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Connection(_))
    }

    /// Create from any error.
    pub fn from_err<E: std::fmt::Display>(err: E) -> Self {
        Self::Other(err.to_string())
    }
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;

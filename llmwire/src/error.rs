//! Pipeline errors.

use llmwire_core::CoreError;
use llmwire_models::ModelError;
use llmwire_retries::RetryError;
use llmwire_streaming::StreamError;
use thiserror::Error;

/// Terminal failure of one request or stream.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration or message-building error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Adapter, registry or response-shape error.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The request failed, after retries if the failure was transient.
    #[error(transparent)]
    Request(#[from] RetryError),

    /// The response stream failed.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Building or sending the HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Whether the error came from configuration rather than the network.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Core(err) => err.is_configuration(),
            Self::Model(err) => err.is_configuration(),
            _ => false,
        }
    }

    /// HTTP status of the failed request, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request(err) => err.status(),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

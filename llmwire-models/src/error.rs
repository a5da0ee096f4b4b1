//! Model-related error types.

use llmwire_core::CoreError;
use thiserror::Error;

/// Errors raised while shaping requests or reading responses.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No adapter handles the requested provider id.
    #[error("no adapter registered for provider '{0}'")]
    UnknownProvider(String),

    /// An adapter was handed a provider of another dialect.
    #[error("adapter '{adapter}' cannot serve provider '{provider}'")]
    DialectMismatch {
        /// Adapter name.
        adapter: &'static str,
        /// Provider id.
        provider: String,
    },

    /// Invalid response from the API.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// API-level error reported in a response body.
    #[error("API error: {message}")]
    Api {
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Configuration error.
    #[error(transparent)]
    Configuration(#[from] CoreError),

    /// Building an HTTP client failed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ModelError {
    /// Create an API error.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            code: None,
        }
    }

    /// Create an API error with code.
    pub fn api_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Whether this error stems from configuration rather than I/O.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownProvider(_) | Self::DialectMismatch { .. } | Self::Configuration(_)
        )
    }
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

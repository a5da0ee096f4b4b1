//! Error types for llmwire-core.
//!
//! Configuration problems are detected here, before any adapter or network
//! code runs, so every variant names the missing or invalid item.

use thiserror::Error;

/// Errors raised while validating configuration or shaping messages.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A required configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A provider identifier that does not name any known provider.
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a configuration error for a missing item.
    pub fn missing(item: impl AsRef<str>) -> Self {
        Self::Configuration(format!("missing {}", item.as_ref()))
    }

    /// Check whether this is a configuration-class error.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::UnknownProvider(_))
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

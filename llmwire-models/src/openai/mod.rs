//! OpenAI chat completions dialect.
//!
//! Twelve providers speak this dialect. They differ only in base URL,
//! default model, thinking convention and search support, all of which
//! live in the [catalog](crate::catalog).
//!
//! ## Example
//!
//! ```rust
//! use llmwire_core::{BuildParams, ProviderConfig, ProviderKind};
//! use llmwire_models::{Adapter, AdapterContext};
//! use llmwire_models::openai::OpenAiAdapter;
//!
//! let params = BuildParams::new("Hello").thinking(true);
//! let config = ProviderConfig::default();
//! let ctx = AdapterContext::new(ProviderKind::DeepSeek, &params, &config);
//!
//! let request = OpenAiAdapter.build(&ctx).unwrap();
//! assert_eq!(request.model, "deepseek-reasoner");
//! assert!(request.url(true).ends_with("/chat/completions"));
//! ```

pub mod adapter;
pub mod stream;
pub mod types;

// Re-exports
pub use adapter::OpenAiAdapter;
pub use stream::OpenAiStreamDecoder;
pub use types::{ChatCompletionChunk, ChatCompletionResponse, OpenAIError, Usage};

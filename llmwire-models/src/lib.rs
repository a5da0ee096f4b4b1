//! # llmwire-models
//!
//! Provider adapters for llmwire.
//!
//! Fourteen providers speak one of three wire dialects:
//!
//! - **OpenAI chat completions**: OpenAI, DeepSeek, Qwen, Moonshot, Zhipu,
//!   Doubao, SiliconFlow, OpenRouter, Groq, Mistral, xAI, Ollama
//! - **Anthropic Messages**: Claude
//! - **Google generateContent**: Gemini
//!
//! An [`Adapter`] turns the conversation and provider settings into a
//! ready-to-send [`AdapterResult`] without touching the network, and hands
//! out a [`StreamDecoder`] that maps the provider's SSE events onto the
//! shared sentinel text stream.
//!
//! ## Example
//!
//! ```rust
//! use llmwire_core::{BuildParams, ProviderConfig};
//! use llmwire_models::{lookup, Adapter, AdapterContext};
//!
//! let (provider, adapter) = lookup("anthropic").unwrap();
//! let params = BuildParams::new("Hello!").language("French");
//! let config = ProviderConfig::default();
//!
//! let request = adapter.build(&AdapterContext::new(provider, &params, &config)).unwrap();
//! let body = request.to_body(true).unwrap();
//! assert_eq!(body["model"], "claude-sonnet-4-5");
//! assert!(body["system"].as_str().unwrap().contains("French"));
//!
//! assert!(lookup("nope").is_err());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod adapter;
pub mod catalog;
pub mod client_cache;
pub mod context;
pub mod decode;
pub mod error;
pub mod tools;

/// OpenAI-compatible providers.
pub mod openai;

/// Anthropic Claude.
pub mod anthropic;

/// Google Gemini.
pub mod google;

// Re-exports
pub use adapter::{adapter_for, build_request, lookup, Adapter};
pub use catalog::{spec, Dialect, ProviderSpec, SearchStyle, ThinkingStyle};
pub use client_cache::ClientCache;
pub use context::{AdapterContext, AdapterResult, RequestPayload, ToolRequest};
pub use decode::{Completion, SentinelWriter, StreamDecoder};
pub use error::{ModelError, ModelResult};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        adapter_for, build_request, lookup, Adapter, AdapterContext, AdapterResult, Completion,
        ModelError, ModelResult, StreamDecoder,
    };
}

//! # llmwire
//!
//! A multi-provider LLM request and streaming pipeline.
//!
//! llmwire shapes one conversation turn for any of fourteen providers,
//! posts it with retries, and splits the streamed answer into three
//! channels: thinking, an inline summary, and the response.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use llmwire::prelude::*;
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), PipelineError> {
//! llmwire::telemetry::init_tracing();
//!
//! let pipeline = ChatPipeline::new(PipelineConfig::default());
//! let request = ChatRequest::new(
//!     "deepseek",
//!     BuildParams::new("Why is the sky blue?").thinking(true).thinking_summary(true),
//!     ProviderConfig::from_env(ProviderKind::DeepSeek),
//! );
//!
//! let (sender, mut receiver) = mpsc::channel(64);
//! let printer = tokio::spawn(async move {
//!     while let Some(event) = receiver.recv().await {
//!         match event {
//!             StreamEvent::Delta(delta) => print!("{}", delta.text),
//!             StreamEvent::Restart { .. } => println!("\n[connection lost, restarting]"),
//!         }
//!     }
//! });
//!
//! let outcome = pipeline.stream_chat(&request, sender, CancellationToken::new()).await?;
//! let _ = printer.await;
//! println!("\nsummary: {}", outcome.summary);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - [`core`]: conversation model, message builder, provider settings
//! - [`models`]: provider adapters, stream decoders, client cache
//! - [`retries`]: retry policy and executor
//! - [`streaming`]: SSE parser and stream-tag machine

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod files;
pub mod pipeline;
pub mod telemetry;

/// Conversation model and message builder.
pub use llmwire_core as core;

/// Provider adapters.
pub use llmwire_models as models;

/// Retry policy.
pub use llmwire_retries as retries;

/// SSE parsing and stream tagging.
pub use llmwire_streaming as streaming;

pub use config::{PipelineConfig, Transport};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{ChatPipeline, ChatRequest, StreamEvent, StreamOutcome, ANTHROPIC_VERSION};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        ChatPipeline, ChatRequest, PipelineConfig, PipelineError, PipelineResult, StreamEvent,
        StreamOutcome, Transport,
    };
    pub use llmwire_core::{
        BuildParams, ConversationMessage, FileReference, ProviderConfig, ProviderKind,
        ThinkingLevel, ThinkingSettings, TokenUsage, ToolChoice, ToolPermissions,
    };
    pub use llmwire_retries::RetryConfig;
    pub use llmwire_streaming::{Channel, ChannelDelta, TaggedOutput};
}

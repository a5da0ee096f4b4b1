//! Anthropic Messages dialect.
//!
//! System directives move to the top-level `system` field, uploaded files
//! become `document` blocks, and thinking is requested with an explicit
//! token budget.

pub mod adapter;
pub mod stream;
pub mod types;

// Re-exports
pub use adapter::{AnthropicAdapter, DEFAULT_MAX_TOKENS, MIN_THINKING_BUDGET};
pub use stream::AnthropicStreamDecoder;
pub use types::{AnthropicContent, AnthropicMessage, ContentBlock, DocumentSource, StreamEvent};

//! # llmwire-core
//!
//! Core types shared by every llmwire crate.
//!
//! - **Provider**: the closed set of supported providers
//! - **Config**: resolved per-provider configuration
//! - **Conversation**: history, attachments and provider-neutral messages
//! - **Builder**: turns history plus a pending message into a message list
//! - **Chat**: OpenAI-style chat messages and tool calls
//! - **Sentinel**: inline markers carried in the logical text stream
//! - **Usage**: token usage
//!
//! ## Example
//!
//! ```rust
//! use llmwire_core::{build_messages, BuildParams, ConversationMessage, NeutralRole};
//!
//! let params = BuildParams::new("What changed?")
//!     .history(vec![ConversationMessage::user("What changed?")])
//!     .language("English");
//!
//! let messages = build_messages(&params);
//! assert_eq!(messages[0].role, NeutralRole::System);
//! assert_eq!(messages.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod builder;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod errors;
pub mod provider;
pub mod sentinel;
pub mod usage;

pub use builder::{build_messages, inject_attachment_notice, to_chat_messages, BuildParams};
pub use chat::{
    ChatMessage, ChatTool, ContentPart, FileContent, FunctionCall, FunctionDefinition,
    MessageContent, ToolCall,
};
pub use config::{
    ProviderConfig, ReasoningEffort, Sampling, ThinkingLevel, ThinkingSettings, ToolChoice,
    ToolPermissions,
};
pub use conversation::{ConversationMessage, FileReference, NeutralMessage, NeutralRole, Role};
pub use errors::{CoreError, Result};
pub use provider::ProviderKind;
pub use usage::TokenUsage;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        build_messages, BuildParams, ChatMessage, ConversationMessage, CoreError, FileReference,
        NeutralMessage, ProviderConfig, ProviderKind, Result, ThinkingSettings, TokenUsage,
    };
}

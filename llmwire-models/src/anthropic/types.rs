//! Anthropic Messages API types.

use llmwire_core::TokenUsage;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ============================================================================
// Request Types
// ============================================================================

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// Role: "user" or "assistant".
    pub role: String,
    /// Message content.
    pub content: AnthropicContent,
}

impl AnthropicMessage {
    /// Create a user message with text.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: AnthropicContent::Text(content.into()),
        }
    }

    /// Create an assistant message with text.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: AnthropicContent::Text(content.into()),
        }
    }
}

/// Message content - can be simple text or content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnthropicContent {
    /// Simple text content.
    Text(String),
    /// Content blocks.
    Blocks(Vec<ContentBlock>),
}

/// Request content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content.
    Text {
        /// The text.
        text: String,
    },
    /// A document from the Files API.
    Document {
        /// Document source.
        source: DocumentSource,
        /// Display title.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
}

impl ContentBlock {
    /// Create a text block.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text { text: s.into() }
    }

    /// Create a document block for an uploaded file.
    pub fn document(file_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::Document {
            source: DocumentSource::File {
                file_id: file_id.into(),
            },
            title: Some(title.into()),
        }
    }
}

/// Document source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentSource {
    /// An uploaded file.
    File {
        /// File id.
        file_id: String,
    },
}

// ============================================================================
// Response Types
// ============================================================================

/// Messages API response.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    /// Response ID.
    #[serde(default)]
    pub id: String,
    /// Content blocks.
    #[serde(default)]
    pub content: Vec<ResponseContentBlock>,
    /// Model used.
    #[serde(default)]
    pub model: String,
    /// Reason for stopping.
    pub stop_reason: Option<String>,
    /// Token usage.
    #[serde(default)]
    pub usage: AnthropicUsage,
}

/// Response content block.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseContentBlock {
    /// Text content.
    Text {
        /// The text.
        text: String,
    },
    /// Tool use.
    ToolUse {
        /// Tool call ID.
        id: String,
        /// Tool name.
        name: String,
        /// Tool input.
        input: JsonValue,
    },
    /// Thinking content.
    Thinking {
        /// The thinking.
        thinking: String,
    },
    /// Anything else (redacted thinking, server tool results).
    #[serde(other)]
    Other,
}

/// Token usage.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(default)]
pub struct AnthropicUsage {
    /// Input tokens.
    pub input_tokens: u64,
    /// Output tokens.
    pub output_tokens: u64,
    /// Tokens read from cache.
    pub cache_read_input_tokens: Option<u64>,
}

impl From<AnthropicUsage> for TokenUsage {
    fn from(usage: AnthropicUsage) -> Self {
        let base = TokenUsage::new(usage.input_tokens, usage.output_tokens);
        match usage.cache_read_input_tokens {
            Some(cached) => base.with_cached(cached),
            None => base,
        }
    }
}

// ============================================================================
// Streaming Types
// ============================================================================

/// SSE stream event.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Message start.
    MessageStart {
        /// Partial message.
        message: PartialMessage,
    },
    /// Content block start.
    ContentBlockStart {
        /// Block index.
        index: usize,
    },
    /// Content block delta.
    ContentBlockDelta {
        /// Block index.
        index: usize,
        /// Delta content.
        delta: ContentBlockDelta,
    },
    /// Content block stop.
    ContentBlockStop {
        /// Block index.
        index: usize,
    },
    /// Message delta.
    MessageDelta {
        /// Usage.
        #[serde(default)]
        usage: Option<DeltaUsage>,
    },
    /// Message stop.
    MessageStop,
    /// Ping (keep-alive).
    Ping,
    /// Error.
    Error {
        /// Error details.
        error: AnthropicErrorBody,
    },
}

/// Partial message at stream start.
#[derive(Debug, Clone, Deserialize)]
pub struct PartialMessage {
    /// Message ID.
    #[serde(default)]
    pub id: String,
    /// Model.
    #[serde(default)]
    pub model: String,
    /// Initial usage.
    #[serde(default)]
    pub usage: AnthropicUsage,
}

/// Content block delta.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlockDelta {
    /// Text delta.
    TextDelta {
        /// Text content.
        text: String,
    },
    /// Thinking delta.
    ThinkingDelta {
        /// Thinking content.
        thinking: String,
    },
    /// Tool input, signatures and future delta kinds.
    #[serde(other)]
    Other,
}

/// Usage delta.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(default)]
pub struct DeltaUsage {
    /// Output tokens so far.
    pub output_tokens: u64,
    /// Input tokens, when restated.
    pub input_tokens: Option<u64>,
    /// Cache reads, when restated.
    pub cache_read_input_tokens: Option<u64>,
}

// ============================================================================
// Error Types
// ============================================================================

/// Anthropic API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicError {
    /// Error details.
    pub error: AnthropicErrorBody,
}

/// Anthropic error body.
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicErrorBody {
    /// Error type.
    #[serde(rename = "type", default)]
    pub error_type: String,
    /// Error message.
    pub message: String,
}

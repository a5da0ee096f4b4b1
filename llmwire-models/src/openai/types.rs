//! OpenAI chat completions response types.
//!
//! Request messages are the shared [`ChatMessage`](llmwire_core::ChatMessage);
//! only the response side is dialect-specific. Compatible providers omit
//! bookkeeping fields freely, so almost everything here defaults.

use llmwire_core::{FunctionCall, TokenUsage, ToolCall};
use serde::Deserialize;
use serde_json::Value as JsonValue;

// ============================================================================
// Response Types
// ============================================================================

/// Chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Response ID.
    #[serde(default)]
    pub id: String,
    /// Model used.
    #[serde(default)]
    pub model: String,
    /// Response choices.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    /// Token usage.
    pub usage: Option<Usage>,
}

/// Chat choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// Choice index.
    #[serde(default)]
    pub index: u32,
    /// The message.
    pub message: ResponseMessage,
    /// Reason for stopping.
    pub finish_reason: Option<String>,
}

/// Response message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResponseMessage {
    /// Role.
    pub role: String,
    /// Text content.
    pub content: Option<String>,
    /// Tool calls.
    pub tool_calls: Option<Vec<ResponseToolCall>>,
    /// Reasoning text (DeepSeek, Qwen, GLM and others).
    #[serde(alias = "reasoning")]
    pub reasoning_content: Option<String>,
}

/// Response tool call.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseToolCall {
    /// Tool call ID.
    pub id: String,
    /// Tool type.
    #[serde(rename = "type", default = "function_type")]
    pub tool_type: String,
    /// Function call.
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

impl From<ResponseToolCall> for ToolCall {
    fn from(call: ResponseToolCall) -> Self {
        ToolCall {
            id: call.id,
            tool_type: call.tool_type,
            function: call.function,
        }
    }
}

/// Token usage.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Usage {
    /// Prompt tokens.
    pub prompt_tokens: u64,
    /// Completion tokens.
    pub completion_tokens: u64,
    /// Total tokens.
    pub total_tokens: u64,
    /// Prompt token details.
    pub prompt_tokens_details: Option<PromptTokensDetails>,
    /// DeepSeek's cache-hit count.
    pub prompt_cache_hit_tokens: Option<u64>,
}

/// Prompt token details.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptTokensDetails {
    /// Cached tokens.
    pub cached_tokens: Option<u64>,
}

impl From<Usage> for TokenUsage {
    fn from(usage: Usage) -> Self {
        let cached = usage
            .prompt_tokens_details
            .and_then(|d| d.cached_tokens)
            .or(usage.prompt_cache_hit_tokens);
        TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            cached_tokens: cached,
        }
        .normalized()
    }
}

// ============================================================================
// Streaming Types
// ============================================================================

/// Chat completion chunk (streaming).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatCompletionChunk {
    /// Response ID.
    pub id: String,
    /// Response choices.
    pub choices: Vec<ChunkChoice>,
    /// Token usage (if stream_options.include_usage is true).
    pub usage: Option<Usage>,
}

/// Chunk choice.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChunkChoice {
    /// Choice index.
    pub index: u32,
    /// Delta content.
    pub delta: ChunkDelta,
    /// Finish reason.
    pub finish_reason: Option<String>,
}

/// Chunk delta.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ChunkDelta {
    /// Role (usually only in first chunk).
    pub role: Option<String>,
    /// Text content delta.
    pub content: Option<String>,
    /// Reasoning delta.
    pub reasoning_content: Option<String>,
    /// Reasoning delta under OpenRouter's field name.
    pub reasoning: Option<String>,
}

impl ChunkDelta {
    /// Reasoning text under either field name.
    #[must_use]
    pub fn reasoning_text(&self) -> Option<&str> {
        self.reasoning_content
            .as_deref()
            .or(self.reasoning.as_deref())
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// OpenAI API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIError {
    /// Error details.
    pub error: OpenAIErrorBody,
}

/// OpenAI error body.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIErrorBody {
    /// Error message.
    pub message: String,
    /// Error type.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Error code; some providers send numbers.
    #[serde(default)]
    pub code: Option<JsonValue>,
}

impl OpenAIErrorBody {
    /// Error code as text.
    #[must_use]
    pub fn code_text(&self) -> Option<String> {
        match &self.code {
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(JsonValue::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }
}

//! Google `generateContent` types.

use llmwire_core::TokenUsage;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Content (message) in a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Role: "user" or "model". Empty for the system instruction.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    /// Content parts.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create user content.
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_parts("user", vec![Part::text(text)])
    }

    /// Create model content.
    pub fn model(text: impl Into<String>) -> Self {
        Self::with_parts("model", vec![Part::text(text)])
    }

    /// Create a system instruction (no role).
    pub fn system(text: impl Into<String>) -> Self {
        Self::with_parts("", vec![Part::text(text)])
    }

    /// Create content with parts.
    pub fn with_parts(role: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            role: role.into(),
            parts,
        }
    }
}

/// Content part.
///
/// The API distinguishes parts by which field is present; thinking text is
/// a text part flagged with `thought: true`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Whether the text is a thought summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
    /// Reference to an uploaded file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
    /// Function call from the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl Part {
    /// Create text part.
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            text: Some(s.into()),
            ..Self::default()
        }
    }

    /// Create file data part.
    pub fn file_data(mime_type: impl Into<String>, file_uri: impl Into<String>) -> Self {
        Self {
            file_data: Some(FileData {
                mime_type: mime_type.into(),
                file_uri: file_uri.into(),
            }),
            ..Self::default()
        }
    }

    /// Whether this is thinking text.
    #[must_use]
    pub fn is_thought(&self) -> bool {
        self.thought.unwrap_or(false)
    }
}

/// File reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    /// MIME type.
    pub mime_type: String,
    /// File URI (gs:// or uploaded file URI).
    pub file_uri: String,
}

/// Function call from the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name.
    pub name: String,
    /// Function arguments.
    #[serde(default)]
    pub args: JsonValue,
}

/// Generation configuration.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Top-p.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Top-k.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u64>,
    /// Max output tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u64>,
    /// Thinking configuration (for thinking models).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

impl GenerationConfig {
    /// Whether nothing is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Thinking configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    /// Token budget for thinking.
    pub thinking_budget: i64,
    /// Stream thought summaries back.
    pub include_thoughts: bool,
}

// ============================================================================
// Response Types
// ============================================================================

/// Generate content response. Stream chunks share this shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidates.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Usage metadata.
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
    /// Prompt feedback (for blocked prompts).
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// Response candidate.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Content.
    #[serde(default)]
    pub content: Option<Content>,
    /// Finish reason.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Usage metadata.
#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageMetadata {
    /// Prompt token count.
    pub prompt_token_count: u64,
    /// Candidates token count.
    pub candidates_token_count: u64,
    /// Total token count.
    pub total_token_count: u64,
    /// Cached content token count.
    pub cached_content_token_count: Option<u64>,
    /// Thinking token count.
    pub thoughts_token_count: Option<u64>,
}

impl From<UsageMetadata> for TokenUsage {
    fn from(usage: UsageMetadata) -> Self {
        TokenUsage {
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count
                + usage.thoughts_token_count.unwrap_or(0),
            total_tokens: usage.total_token_count,
            cached_tokens: usage.cached_content_token_count,
        }
        .normalized()
    }
}

/// Prompt feedback (for blocked prompts).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Block reason.
    #[serde(default)]
    pub block_reason: Option<String>,
}

// ============================================================================
// Error Types
// ============================================================================

/// Google API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleError {
    /// Error details.
    pub error: GoogleErrorBody,
}

/// Google error body.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleErrorBody {
    /// Error code.
    #[serde(default)]
    pub code: u32,
    /// Error message.
    pub message: String,
    /// Error status.
    #[serde(default)]
    pub status: Option<String>,
}

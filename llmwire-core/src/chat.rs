//! OpenAI-style chat messages with structured content.
//!
//! Every OpenAI-compatible provider shares these types. Content is a plain
//! string unless a message carries provider file references, in which case
//! it becomes a list of typed parts.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message author.
    pub role: String,
    /// Message content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
    /// Tool calls made by the assistant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// ID of the tool call being responded to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Create a message with text content.
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(MessageContent::Text(content.into())),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::text("user", content)
    }

    /// Create an assistant message carrying tool calls.
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: Some(MessageContent::Text(String::new())),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    /// Create a tool response message.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(MessageContent::Text(content.into())),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Whether this is a user message.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == "user"
    }

    /// Concatenated text of all text parts.
    #[must_use]
    pub fn text_content(&self) -> String {
        match &self.content {
            Some(MessageContent::Text(s)) => s.clone(),
            Some(MessageContent::Parts(parts)) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::File { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
            None => String::new(),
        }
    }

    /// Append text using the array-or-string rule.
    ///
    /// String content gets the text appended after a blank line; part lists
    /// get it appended to the last text part, or a new text part if none.
    pub fn append_text(&mut self, addition: &str) {
        match &mut self.content {
            Some(MessageContent::Text(s)) => push_paragraph(s, addition),
            Some(MessageContent::Parts(parts)) => {
                let last_text = parts.iter_mut().rev().find_map(|p| match p {
                    ContentPart::Text { text } => Some(text),
                    ContentPart::File { .. } => None,
                });
                match last_text {
                    Some(text) => push_paragraph(text, addition),
                    None => parts.push(ContentPart::text(addition)),
                }
            }
            None => self.content = Some(MessageContent::Text(addition.to_string())),
        }
    }
}

/// Append `addition` to `base`, separated by a blank line when `base` has text.
pub(crate) fn push_paragraph(base: &mut String, addition: &str) {
    if !base.trim().is_empty() {
        base.push_str("\n\n");
    }
    base.push_str(addition);
}

/// Message content (can be text or multipart).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content.
    Text(String),
    /// Multipart content.
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Build content from parts; an empty list collapses to the empty string.
    #[must_use]
    pub fn from_parts(parts: Vec<ContentPart>) -> Self {
        if parts.is_empty() {
            Self::Text(String::new())
        } else {
            Self::Parts(parts)
        }
    }
}

/// Content part for multipart messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
    /// Uploaded file reference.
    File {
        /// File details.
        file: FileContent,
    },
}

impl ContentPart {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a file part.
    pub fn file(file_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::File {
            file: FileContent {
                file_id: file_id.into(),
                filename: Some(filename.into()),
            },
        }
    }
}

/// File reference inside a content part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// Uploaded file id.
    pub file_id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTool {
    /// Tool type (always "function").
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function definition.
    pub function: FunctionDefinition,
}

impl ChatTool {
    /// Create a function tool.
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: JsonValue,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// Function definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Function name.
    pub name: String,
    /// Function description.
    pub description: String,
    /// Parameter schema.
    pub parameters: JsonValue,
}

/// Tool call in a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool call ID.
    pub id: String,
    /// Tool type.
    #[serde(rename = "type", default = "function_type")]
    pub tool_type: String,
    /// Function call details.
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

/// Function call details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name.
    pub name: String,
    /// Arguments as JSON string.
    #[serde(default)]
    pub arguments: String,
}

//! Conversation history as supplied by the surrounding application.

use serde::{Deserialize, Serialize};

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human.
    User,
    /// The assistant.
    Model,
}

/// A file already uploaded to one provider's file store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    /// Provider tag (`openai`, `anthropic`, `google`, `local`, ...).
    pub provider: String,
    /// Provider file id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    /// Provider file URI (Google).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_uri: Option<String>,
    /// Display name.
    pub name: String,
    /// MIME type, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl FileReference {
    /// Provider tag for files on the local disk, read through a tool.
    pub const LOCAL: &'static str = "local";

    /// Create a reference by file id.
    pub fn with_id(
        provider: impl Into<String>,
        file_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            file_id: Some(file_id.into()),
            file_uri: None,
            name: name.into(),
            mime_type: None,
        }
    }

    /// Create a reference by URI.
    pub fn with_uri(
        provider: impl Into<String>,
        file_uri: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            file_id: None,
            file_uri: Some(file_uri.into()),
            name: name.into(),
            mime_type: None,
        }
    }

    /// Create a reference to a local file.
    pub fn local(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_uri(Self::LOCAL, path, name)
    }

    /// Set the MIME type.
    #[must_use]
    pub fn mime(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Whether this reference belongs to the given provider tag.
    #[must_use]
    pub fn is_for(&self, provider: &str) -> bool {
        self.provider.eq_ignore_ascii_case(provider)
    }

    /// Whether this is a local file.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.is_for(Self::LOCAL)
    }

    /// The id or URI, whichever is set.
    #[must_use]
    pub fn locator(&self) -> Option<&str> {
        self.file_id.as_deref().or(self.file_uri.as_deref())
    }
}

/// One turn of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Author.
    pub role: Role,
    /// Plain text content.
    pub content: String,
    /// Attached files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<FileReference>,
}

impl ConversationMessage {
    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    /// A model turn.
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    /// Attach files.
    #[must_use]
    pub fn with_attachments(mut self, attachments: Vec<FileReference>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Role in the provider-neutral message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeutralRole {
    /// Instruction message.
    System,
    /// Human turn.
    User,
    /// Model turn.
    Assistant,
}

impl NeutralRole {
    /// OpenAI-style role name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl From<Role> for NeutralRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::Model => Self::Assistant,
        }
    }
}

/// A provider-neutral message, produced by the message builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeutralMessage {
    /// Role.
    pub role: NeutralRole,
    /// Text content.
    pub content: String,
    /// Attached files, unfiltered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<FileReference>,
}

impl NeutralMessage {
    /// A system instruction.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(NeutralRole::System, content)
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(NeutralRole::User, content)
    }

    /// An assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(NeutralRole::Assistant, content)
    }

    fn new(role: NeutralRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    /// Attachments tagged for the given provider.
    pub fn attachments_for<'a>(
        &'a self,
        provider: &'a str,
    ) -> impl Iterator<Item = &'a FileReference> + 'a {
        self.attachments.iter().filter(move |f| f.is_for(provider))
    }

    /// Whether any attachment is a local file.
    #[must_use]
    pub fn has_local_attachments(&self) -> bool {
        self.attachments.iter().any(FileReference::is_local)
    }
}

impl From<&ConversationMessage> for NeutralMessage {
    fn from(msg: &ConversationMessage) -> Self {
        Self {
            role: msg.role.into(),
            content: msg.content.clone(),
            attachments: msg.attachments.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_reference_filtering() {
        let mut msg = NeutralMessage::user("read these");
        msg.attachments = vec![
            FileReference::with_id("openai", "file-1", "a.pdf"),
            FileReference::with_uri("google", "files/abc", "b.pdf"),
            FileReference::local("/tmp/c.txt", "c.txt"),
        ];

        let openai: Vec<_> = msg.attachments_for("openai").collect();
        assert_eq!(openai.len(), 1);
        assert_eq!(openai[0].locator(), Some("file-1"));
        assert!(msg.has_local_attachments());
    }

    #[test]
    fn test_conversation_message_json() {
        let msg: ConversationMessage = serde_json::from_str(
            r#"{"role":"model","content":"hi","attachments":[{"provider":"google","fileUri":"files/x","name":"x.png","mimeType":"image/png"}]}"#,
        )
        .unwrap();
        assert_eq!(msg.role, Role::Model);
        assert_eq!(msg.attachments[0].mime_type.as_deref(), Some("image/png"));
        assert_eq!(NeutralMessage::from(&msg).role, NeutralRole::Assistant);
    }
}

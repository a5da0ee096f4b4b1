//! Message builder.
//!
//! Turns the caller's history plus the pending user message into an ordered,
//! provider-neutral message list, and from there into OpenAI-style chat
//! messages. Instructions (language directive, thinking-summary request,
//! attachment notice) are injected here so every adapter sees the same
//! conversation.

use crate::chat::{push_paragraph, ChatMessage, ContentPart, MessageContent};
use crate::conversation::{ConversationMessage, FileReference, NeutralMessage, NeutralRole};
use serde::{Deserialize, Serialize};

/// Instruction asking the model to append a delimited summary.
pub const THINKING_SUMMARY_INSTRUCTION: &str =
    "After answering, add a short 1-2 sentence summary in <thinking_summary>...</thinking_summary>.";

/// First line of the attachment notice; also the idempotency marker.
pub const ATTACHMENT_NOTICE_HEADER: &str = "[Attached files]";

/// Name of the file-reading tool the attachment notice points at.
pub const READ_FILE_TOOL: &str = "read_file";

/// Inputs to [`build_messages`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildParams {
    /// Prior conversation, oldest first.
    pub history: Vec<ConversationMessage>,
    /// The message the user just sent.
    pub pending_message: String,
    /// Files attached to the pending message.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pending_attachments: Vec<FileReference>,
    /// Whether thinking was requested for this turn.
    pub use_thinking: bool,
    /// Whether search was requested for this turn.
    pub use_search: bool,
    /// Response language, if the user picked one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Whether to request an inline thinking summary.
    pub show_thinking_summary: bool,
}

impl BuildParams {
    /// Create params for a pending message.
    pub fn new(pending_message: impl Into<String>) -> Self {
        Self {
            pending_message: pending_message.into(),
            ..Self::default()
        }
    }

    /// Set the history.
    #[must_use]
    pub fn history(mut self, history: Vec<ConversationMessage>) -> Self {
        self.history = history;
        self
    }

    /// Attach files to the pending message.
    #[must_use]
    pub fn attachments(mut self, attachments: Vec<FileReference>) -> Self {
        self.pending_attachments = attachments;
        self
    }

    /// Request thinking.
    #[must_use]
    pub fn thinking(mut self, on: bool) -> Self {
        self.use_thinking = on;
        self
    }

    /// Request search.
    #[must_use]
    pub fn search(mut self, on: bool) -> Self {
        self.use_search = on;
        self
    }

    /// Set the response language.
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Request the inline thinking summary.
    #[must_use]
    pub fn thinking_summary(mut self, on: bool) -> Self {
        self.show_thinking_summary = on;
        self
    }

    /// The summary instruction only makes sense when the model thinks.
    #[must_use]
    pub fn wants_thinking_summary(&self) -> bool {
        self.show_thinking_summary && self.use_thinking
    }

    /// Local-file attachments on the history and the pending message,
    /// deduplicated.
    #[must_use]
    pub fn local_files(&self) -> Vec<FileReference> {
        let mut files: Vec<FileReference> = Vec::new();
        for file in self
            .history
            .iter()
            .flat_map(|m| m.attachments.iter())
            .chain(&self.pending_attachments)
            .filter(|f| f.is_local())
        {
            if !files.contains(file) {
                files.push(file.clone());
            }
        }
        files
    }
}

/// System directive pinning the response language.
#[must_use]
pub fn language_directive(language: &str) -> String {
    format!("Always respond in {language} unless the user explicitly asks for another language.")
}

/// Build the provider-neutral message list.
///
/// Layout: system directives first, then the mapped history. The pending
/// message is matched against the most recent user message with identical
/// trimmed text, falling back to the last user message; when the history has
/// no user message at all a new one is appended. Instructions land on that
/// target message.
pub fn build_messages(params: &BuildParams) -> Vec<NeutralMessage> {
    let mut messages = Vec::with_capacity(params.history.len() + 2);

    if let Some(language) = params
        .language
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        messages.push(NeutralMessage::system(language_directive(language)));
    }

    messages.extend(params.history.iter().map(NeutralMessage::from));

    let target = match find_target(&messages, &params.pending_message) {
        Some(idx) => {
            merge_attachments(&mut messages[idx], &params.pending_attachments);
            idx
        }
        None => {
            tracing::trace!("no user message in history, appending pending turn");
            let mut pending = NeutralMessage::user(params.pending_message.clone());
            pending.attachments = params.pending_attachments.clone();
            messages.push(pending);
            messages.len() - 1
        }
    };

    if params.wants_thinking_summary() {
        push_paragraph(&mut messages[target].content, THINKING_SUMMARY_INSTRUCTION);
    }

    messages
}

fn find_target(messages: &[NeutralMessage], pending: &str) -> Option<usize> {
    let pending = pending.trim();
    let mut last_user = None;

    for (idx, msg) in messages.iter().enumerate().rev() {
        if msg.role != NeutralRole::User {
            continue;
        }
        if msg.content.trim() == pending {
            return Some(idx);
        }
        last_user.get_or_insert(idx);
    }

    last_user
}

fn merge_attachments(target: &mut NeutralMessage, extra: &[FileReference]) {
    for file in extra {
        if !target.attachments.contains(file) {
            target.attachments.push(file.clone());
        }
    }
}

/// Encode neutral messages as OpenAI-style chat messages.
///
/// Only attachments tagged for `provider` that carry a file id become file
/// parts; a message without any keeps plain string content.
pub fn to_chat_messages(messages: &[NeutralMessage], provider: &str) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|msg| {
            let files: Vec<ContentPart> = msg
                .attachments_for(provider)
                .filter_map(|f| f.file_id.as_deref().map(|id| ContentPart::file(id, &f.name)))
                .collect();

            let content = if files.is_empty() {
                MessageContent::Text(msg.content.clone())
            } else {
                let mut parts = Vec::with_capacity(files.len() + 1);
                if !msg.content.is_empty() {
                    parts.push(ContentPart::text(msg.content.clone()));
                }
                parts.extend(files);
                MessageContent::from_parts(parts)
            };

            ChatMessage {
                role: msg.role.as_str().to_string(),
                content: Some(content),
                tool_calls: None,
                tool_call_id: None,
            }
        })
        .collect()
}

/// Local-file attachments across all messages, deduplicated.
pub fn local_attachments(messages: &[NeutralMessage]) -> Vec<FileReference> {
    let mut files: Vec<FileReference> = Vec::new();
    for file in messages
        .iter()
        .flat_map(|m| m.attachments.iter())
        .filter(|f| f.is_local())
    {
        if !files.contains(file) {
            files.push(file.clone());
        }
    }
    files
}

/// Human-readable notice listing attached files.
#[must_use]
pub fn attachment_notice(files: &[FileReference]) -> String {
    let mut notice = String::from(ATTACHMENT_NOTICE_HEADER);
    for file in files {
        notice.push_str("\n- ");
        notice.push_str(&file.name);
        if let Some(mime) = &file.mime_type {
            notice.push_str(&format!(" ({mime})"));
        }
        if let Some(path) = file.locator() {
            notice.push_str(&format!(": {path}"));
        }
    }
    notice.push_str(&format!(
        "\nCall the `{READ_FILE_TOOL}` tool with a file's path to read it before answering questions about its contents."
    ));
    notice
}

/// Append the attachment notice to the last user message.
///
/// Idempotent: a target that already carries the notice is left alone.
/// Without any user message, a new one holding only the notice is appended.
/// Returns whether the list changed.
pub fn inject_attachment_notice(messages: &mut Vec<ChatMessage>, files: &[FileReference]) -> bool {
    if files.is_empty() {
        return false;
    }

    let notice = attachment_notice(files);
    match messages.iter_mut().rev().find(|m| m.is_user()) {
        Some(target) if target.text_content().contains(ATTACHMENT_NOTICE_HEADER) => false,
        Some(target) => {
            target.append_text(&notice);
            true
        }
        None => {
            messages.push(ChatMessage::user(notice));
            true
        }
    }
}

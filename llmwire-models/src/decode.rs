//! Turning provider responses into the sentinel text stream.
//!
//! Each dialect ships a [`StreamDecoder`] that maps one parsed SSE event to
//! zero or more logical chunks. Thinking text is prefixed with
//! [`THINKING_PREFIX`](llmwire_core::sentinel::THINKING_PREFIX), the switch
//! back to answer text is marked with
//! [`END_THINKING`](llmwire_core::sentinel::END_THINKING), and usage travels
//! as a `__TOKEN_USAGE__` record.

use llmwire_core::sentinel::{self, END_THINKING};
use llmwire_core::{TokenUsage, ToolCall};
use llmwire_streaming::{SseEvent, StreamResult};

/// Decodes one dialect's streaming events.
pub trait StreamDecoder: Send {
    /// Logical chunks for one event.
    fn decode(&mut self, event: &SseEvent) -> StreamResult<Vec<String>>;

    /// Chunks owed once the stream has ended.
    fn finish(&mut self) -> Vec<String> {
        Vec::new()
    }
}

/// Emits sentinel chunks and tracks the thinking phase.
#[derive(Debug, Default, Clone)]
pub struct SentinelWriter {
    in_thinking: bool,
}

impl SentinelWriter {
    /// Create a writer outside the thinking phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the last emitted text was thinking.
    #[must_use]
    pub fn in_thinking(&self) -> bool {
        self.in_thinking
    }

    /// Emit a thinking chunk.
    pub fn thinking(&mut self, out: &mut Vec<String>, text: &str) {
        if text.is_empty() {
            return;
        }
        self.in_thinking = true;
        out.push(sentinel::thinking(text));
    }

    /// Emit answer text, closing the thinking phase first if needed.
    pub fn content(&mut self, out: &mut Vec<String>, text: &str) {
        if text.is_empty() {
            return;
        }
        self.close(out);
        out.push(text.to_string());
    }

    /// Emit a usage record.
    pub fn usage(&mut self, out: &mut Vec<String>, usage: &TokenUsage) {
        out.push(sentinel::token_usage(&usage.normalized()));
    }

    /// Leave the thinking phase.
    pub fn close(&mut self, out: &mut Vec<String>) {
        if self.in_thinking {
            self.in_thinking = false;
            out.push(END_THINKING.to_string());
        }
    }
}

/// A non-streaming response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    /// Answer text.
    pub text: String,
    /// Reasoning text, when the provider returned any.
    pub thinking: Option<String>,
    /// Token usage.
    pub usage: Option<TokenUsage>,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCall>,
}

impl Completion {
    /// Whether the model asked for tools.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The same content expressed as stream chunks.
    #[must_use]
    pub fn sentinel_chunks(&self) -> Vec<String> {
        let mut writer = SentinelWriter::new();
        let mut out = Vec::new();
        if let Some(thinking) = &self.thinking {
            writer.thinking(&mut out, thinking);
        }
        writer.content(&mut out, &self.text);
        writer.close(&mut out);
        if let Some(usage) = &self.usage {
            writer.usage(&mut out, usage);
        }
        out
    }
}

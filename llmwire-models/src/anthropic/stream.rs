//! Anthropic SSE stream decoder.
//!
//! Anthropic streams typed events (`message_start`, `content_block_delta`,
//! `message_delta`, ...). Usage is split across the stream: input and cache
//! counts arrive with `message_start`, output counts with `message_delta`.

use super::types::{AnthropicUsage, ContentBlockDelta, StreamEvent};
use crate::decode::{SentinelWriter, StreamDecoder};
use llmwire_core::TokenUsage;
use llmwire_streaming::{SseEvent, StreamError, StreamResult};
use tracing::{trace, warn};

/// Decoder for Anthropic streams.
#[derive(Debug, Default)]
pub struct AnthropicStreamDecoder {
    writer: SentinelWriter,
    usage: AnthropicUsage,
}

impl AnthropicStreamDecoder {
    /// Create a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamDecoder for AnthropicStreamDecoder {
    fn decode(&mut self, event: &SseEvent) -> StreamResult<Vec<String>> {
        let data = event.data.trim();
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let parsed: StreamEvent = match serde_json::from_str(data) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, event = ?event.event, "dropping malformed messages event");
                return Ok(Vec::new());
            }
        };

        let mut out = Vec::new();
        match parsed {
            StreamEvent::MessageStart { message } => {
                self.usage = message.usage;
            }
            StreamEvent::ContentBlockDelta { delta, .. } => match delta {
                ContentBlockDelta::ThinkingDelta { thinking } => {
                    self.writer.thinking(&mut out, &thinking);
                }
                ContentBlockDelta::TextDelta { text } => {
                    self.writer.content(&mut out, &text);
                }
                ContentBlockDelta::Other => {}
            },
            StreamEvent::MessageDelta { usage: Some(delta) } => {
                self.usage.output_tokens = delta.output_tokens;
                if let Some(input) = delta.input_tokens {
                    self.usage.input_tokens = input;
                }
                if delta.cache_read_input_tokens.is_some() {
                    self.usage.cache_read_input_tokens = delta.cache_read_input_tokens;
                }
                self.writer.usage(&mut out, &TokenUsage::from(self.usage));
            }
            StreamEvent::Error { error } => {
                return Err(StreamError::Provider(error.message));
            }
            other => trace!(event = ?other, "ignoring messages event"),
        }
        Ok(out)
    }
}

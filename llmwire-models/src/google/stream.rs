//! Google SSE stream decoder.
//!
//! With `alt=sse` every event carries a complete [`GenerateContentResponse`]
//! holding only the newly generated parts. `usageMetadata` is cumulative, so
//! the latest copy is kept and reported once the stream ends.

use super::types::{GenerateContentResponse, UsageMetadata};
use crate::decode::{SentinelWriter, StreamDecoder};
use crate::openai::stream::provider_message;
use llmwire_core::TokenUsage;
use llmwire_streaming::{SseEvent, StreamError, StreamResult};
use serde_json::Value;
use tracing::warn;

/// Decoder for Google streams.
#[derive(Debug, Default)]
pub struct GoogleStreamDecoder {
    writer: SentinelWriter,
    usage: Option<UsageMetadata>,
}

impl GoogleStreamDecoder {
    /// Create a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamDecoder for GoogleStreamDecoder {
    fn decode(&mut self, event: &SseEvent) -> StreamResult<Vec<String>> {
        let data = event.data.trim();
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let value: Value = match serde_json::from_str(data) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "dropping malformed generateContent chunk");
                return Ok(Vec::new());
            }
        };
        if let Some(error) = value.get("error") {
            return Err(StreamError::Provider(provider_message(error)));
        }

        let chunk: GenerateContentResponse = match serde_json::from_value(value) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, "dropping generateContent chunk with unexpected shape");
                return Ok(Vec::new());
            }
        };

        let mut out = Vec::new();
        let parts = chunk
            .candidates
            .iter()
            .take(1)
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter());
        for part in parts {
            let Some(text) = part.text.as_deref() else {
                continue;
            };
            if part.is_thought() {
                self.writer.thinking(&mut out, text);
            } else {
                self.writer.content(&mut out, text);
            }
        }

        if chunk.usage_metadata.is_some() {
            self.usage = chunk.usage_metadata;
        }
        Ok(out)
    }

    fn finish(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(usage) = self.usage.take() {
            self.writer.usage(&mut out, &TokenUsage::from(usage));
        }
        out
    }
}

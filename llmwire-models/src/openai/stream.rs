//! OpenAI SSE stream decoder.
//!
//! Each `data:` payload is a [`ChatCompletionChunk`]. Reasoning deltas become
//! thinking chunks, content deltas become answer text, and the trailing
//! usage chunk (requested with `stream_options.include_usage`) becomes a
//! usage record.

use super::types::ChatCompletionChunk;
use crate::decode::{SentinelWriter, StreamDecoder};
use llmwire_core::TokenUsage;
use llmwire_streaming::{SseEvent, StreamError, StreamResult};
use serde_json::Value;
use tracing::warn;

/// Decoder for OpenAI-compatible streams.
#[derive(Debug, Default)]
pub struct OpenAiStreamDecoder {
    writer: SentinelWriter,
}

impl OpenAiStreamDecoder {
    /// Create a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamDecoder for OpenAiStreamDecoder {
    fn decode(&mut self, event: &SseEvent) -> StreamResult<Vec<String>> {
        let data = event.data.trim();
        if data.is_empty() || event.is_done() {
            return Ok(Vec::new());
        }

        let value: Value = match serde_json::from_str(data) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "dropping malformed chat completion chunk");
                return Ok(Vec::new());
            }
        };

        if let Some(error) = value.get("error") {
            return Err(StreamError::Provider(provider_message(error)));
        }

        let chunk: ChatCompletionChunk = match serde_json::from_value(value) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, "dropping chat completion chunk with unexpected shape");
                return Ok(Vec::new());
            }
        };

        let mut out = Vec::new();
        for choice in &chunk.choices {
            if let Some(reasoning) = choice.delta.reasoning_text() {
                self.writer.thinking(&mut out, reasoning);
            }
            if let Some(content) = &choice.delta.content {
                self.writer.content(&mut out, content);
            }
        }
        if let Some(usage) = chunk.usage {
            self.writer.usage(&mut out, &TokenUsage::from(usage));
        }
        Ok(out)
    }
}

/// Message text of an error object, or the raw JSON.
pub(crate) fn provider_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode_all(events: &[&str]) -> Vec<String> {
        let mut decoder = OpenAiStreamDecoder::new();
        events
            .iter()
            .flat_map(|data| decoder.decode(&SseEvent::data(*data)).unwrap())
            .collect()
    }

    #[test]
    fn test_reasoning_then_content() {
        let chunks = decode_all(&[
            r#"{"choices":[{"delta":{"role":"assistant","reasoning_content":"Let me "}}]}"#,
            r#"{"choices":[{"delta":{"reasoning_content":"think"}}]}"#,
            r#"{"choices":[{"delta":{"content":"Answer"}}]}"#,
            r#"{"choices":[],"usage":{"prompt_tokens":4,"completion_tokens":3,"total_tokens":7}}"#,
            "[DONE]",
        ]);
        assert_eq!(
            chunks,
            vec![
                "__THINKING__Let me ",
                "__THINKING__think",
                "__END_THINKING__",
                "Answer",
                r#"__TOKEN_USAGE__{"prompt_tokens":4,"completion_tokens":3,"total_tokens":7}"#,
            ]
        );
    }

    #[test]
    fn test_openrouter_reasoning_field() {
        let chunks = decode_all(&[
            r#"{"choices":[{"delta":{"reasoning":"hm"}}]}"#,
            r#"{"choices":[{"delta":{"content":"ok"}}]}"#,
        ]);
        assert_eq!(chunks, vec!["__THINKING__hm", "__END_THINKING__", "ok"]);
    }

    #[test]
    fn test_malformed_chunk_is_skipped() {
        let chunks = decode_all(&[
            r#"{"choices":[{"delta":{"content":"a"}}"#,
            r#"{"choices":[{"delta":{"content":"b"}}]}"#,
        ]);
        assert_eq!(chunks, vec!["b"]);
    }

    #[test]
    fn test_error_payload_surfaces() {
        let mut decoder = OpenAiStreamDecoder::new();
        let err = decoder
            .decode(&SseEvent::data(r#"{"error":{"message":"overloaded"}}"#))
            .unwrap_err();
        assert!(matches!(err, StreamError::Provider(ref m) if m == "overloaded"));
    }
}

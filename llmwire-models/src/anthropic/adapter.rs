//! Request building for the Anthropic Messages API.

use super::stream::AnthropicStreamDecoder;
use super::types::{
    AnthropicContent, AnthropicError, AnthropicMessage, ContentBlock, MessagesResponse,
    ResponseContentBlock,
};
use crate::adapter::{ensure_dialect, Adapter};
use crate::catalog::Dialect;
use crate::context::{AdapterContext, AdapterResult, RequestPayload};
use crate::decode::{Completion, StreamDecoder};
use crate::error::{ModelError, ModelResult};
use llmwire_core::{build_messages, FunctionCall, NeutralMessage, NeutralRole, ToolCall};
use serde_json::{json, Map, Value};
use tracing::debug;

/// `max_tokens` when none is configured. The Messages API requires one.
pub const DEFAULT_MAX_TOKENS: u64 = 4096;

/// Smallest thinking budget the API accepts.
pub const MIN_THINKING_BUDGET: i64 = 1024;

/// Adapter for Anthropic.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicAdapter;

impl Adapter for AnthropicAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Anthropic
    }

    fn build(&self, ctx: &AdapterContext<'_>) -> ModelResult<AdapterResult> {
        ensure_dialect(Dialect::Anthropic, ctx)?;

        let model = ctx.resolve_model();
        let neutral = build_messages(&ctx.effective_params());
        let tag = ctx.provider.as_str();

        let system: Vec<&str> = neutral
            .iter()
            .filter(|m| m.role == NeutralRole::System)
            .map(|m| m.content.as_str())
            .collect();
        let system = (!system.is_empty()).then(|| system.join("\n\n"));

        let messages: Vec<AnthropicMessage> = neutral
            .iter()
            .filter(|m| m.role != NeutralRole::System)
            .map(|m| to_anthropic(m, tag))
            .collect();

        let mut extra_body = Map::new();
        let mut max_tokens = ctx.config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);

        if ctx.thinking_active() {
            let budget = ctx.config.thinking.resolve_budget().max(MIN_THINKING_BUDGET);
            // Budget must stay below max_tokens.
            let budget_u64 = budget.unsigned_abs();
            if max_tokens <= budget_u64 {
                max_tokens = budget_u64 + DEFAULT_MAX_TOKENS;
            }
            extra_body.insert(
                "thinking".into(),
                json!({"type": "enabled", "budget_tokens": budget}),
            );
        } else {
            let sampling = ctx.config.sampling();
            if let Some(temperature) = sampling.temperature {
                extra_body.insert("temperature".into(), json!(temperature));
            }
            if let Some(top_p) = sampling.top_p {
                extra_body.insert("top_p".into(), json!(top_p));
            }
            if let Some(top_k) = sampling.top_k {
                extra_body.insert("top_k".into(), json!(top_k));
            }
        }
        extra_body.insert("max_tokens".into(), json!(max_tokens));

        if ctx.params.use_search {
            debug!(provider = %ctx.provider, "web search not supported, ignoring toggle");
        }

        debug!(
            provider = %ctx.provider,
            model = %model,
            messages = messages.len(),
            thinking = ctx.thinking_active(),
            "built messages request"
        );

        Ok(AdapterResult {
            provider: ctx.provider,
            endpoint: ctx.base_url(),
            model,
            payload: RequestPayload::Anthropic { system, messages },
            extra_body,
            tools: None,
        })
    }

    fn decoder(&self) -> Box<dyn StreamDecoder> {
        Box::new(AnthropicStreamDecoder::new())
    }

    fn extract_completion(&self, body: &Value) -> ModelResult<Completion> {
        if body.get("type").and_then(Value::as_str) == Some("error") {
            let err: AnthropicError = serde_json::from_value(body.clone())?;
            return Err(ModelError::api_with_code(err.error.message, err.error.error_type));
        }

        let response: MessagesResponse = serde_json::from_value(body.clone())?;
        let mut completion = Completion {
            usage: Some(response.usage.into()),
            ..Completion::default()
        };
        let mut thinking = String::new();

        for block in response.content {
            match block {
                ResponseContentBlock::Text { text } => completion.text.push_str(&text),
                ResponseContentBlock::Thinking { thinking: t } => thinking.push_str(&t),
                ResponseContentBlock::ToolUse { id, name, input } => {
                    completion.tool_calls.push(ToolCall {
                        id,
                        tool_type: "function".to_string(),
                        function: FunctionCall {
                            name,
                            arguments: input.to_string(),
                        },
                    });
                }
                ResponseContentBlock::Other => {}
            }
        }

        completion.thinking = (!thinking.is_empty()).then_some(thinking);
        Ok(completion)
    }
}

fn to_anthropic(msg: &NeutralMessage, tag: &str) -> AnthropicMessage {
    let role = match msg.role {
        NeutralRole::Assistant => "assistant",
        NeutralRole::User | NeutralRole::System => "user",
    };

    let documents: Vec<ContentBlock> = msg
        .attachments_for(tag)
        .filter_map(|f| f.file_id.as_deref().map(|id| ContentBlock::document(id, &f.name)))
        .collect();

    let content = if documents.is_empty() {
        AnthropicContent::Text(msg.content.clone())
    } else {
        let mut blocks = Vec::with_capacity(documents.len() + 1);
        if !msg.content.is_empty() {
            blocks.push(ContentBlock::text(msg.content.clone()));
        }
        blocks.extend(documents);
        AnthropicContent::Blocks(blocks)
    };

    AnthropicMessage {
        role: role.to_string(),
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmwire_core::{
        BuildParams, ConversationMessage, FileReference, ProviderConfig, ProviderKind,
        ThinkingLevel, ThinkingSettings,
    };
    use pretty_assertions::assert_eq;

    fn build(params: &BuildParams, config: &ProviderConfig) -> AdapterResult {
        AnthropicAdapter
            .build(&AdapterContext::new(ProviderKind::Anthropic, params, config))
            .unwrap()
    }

    #[test]
    fn test_system_prompt_is_separate() {
        let params = BuildParams::new("Hola").language("Spanish");
        let result = build(&params, &ProviderConfig::default());
        let body = result.to_body(true).unwrap();

        assert_eq!(
            body["system"],
            "Always respond in Spanish unless the user explicitly asks for another language."
        );
        assert_eq!(body["messages"], json!([{"role": "user", "content": "Hola"}]));
        assert_eq!(body["model"], "claude-sonnet-4-5");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn test_thinking_budget_and_max_tokens() {
        let mut config = ProviderConfig::default()
            .with_temperature(0.7)
            .with_thinking(ThinkingSettings::with_level(ThinkingLevel::Low).budget(500.0));
        config.max_tokens = Some(800);
        let result = build(&BuildParams::new("q").thinking(true), &config);

        assert_eq!(
            result.extra_body["thinking"],
            json!({"type": "enabled", "budget_tokens": 1024})
        );
        assert_eq!(result.extra_body["max_tokens"], json!(1024 + DEFAULT_MAX_TOKENS));
        assert!(!result.extra_body.contains_key("temperature"));
    }

    #[test]
    fn test_temperature_without_thinking() {
        let config = ProviderConfig::default().with_temperature(0.2);
        let result = build(&BuildParams::new("q"), &config);
        assert_eq!(result.extra_body["temperature"], json!(0.2));
        assert!(!result.extra_body.contains_key("thinking"));
    }

    #[test]
    fn test_documents_only_for_anthropic_files() {
        let history = vec![
            ConversationMessage::user("Read").with_attachments(vec![
                FileReference::with_id("anthropic", "file_a", "a.pdf"),
                FileReference::with_id("openai", "file-b", "b.pdf"),
            ]),
            ConversationMessage::model("Done"),
        ];
        let params = BuildParams::new("Read").history(history);
        let result = build(&params, &ProviderConfig::default());

        let RequestPayload::Anthropic { messages, .. } = &result.payload else {
            panic!("expected anthropic payload");
        };
        assert_eq!(
            messages[0].content,
            AnthropicContent::Blocks(vec![
                ContentBlock::text("Read"),
                ContentBlock::document("file_a", "a.pdf"),
            ])
        );
        assert_eq!(messages[1], AnthropicMessage::assistant("Done"));
    }

    #[test]
    fn test_extract_completion() {
        let body = json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-5",
            "content": [
                {"type": "thinking", "thinking": "Consider.", "signature": "sig"},
                {"type": "text", "text": "Answer."}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 4}
        });
        let completion = AnthropicAdapter.extract_completion(&body).unwrap();
        assert_eq!(completion.text, "Answer.");
        assert_eq!(completion.thinking.as_deref(), Some("Consider."));
        assert_eq!(completion.usage.unwrap().total_tokens, 14);
    }

    #[test]
    fn test_extract_error() {
        let body = json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"}
        });
        let err = AnthropicAdapter.extract_completion(&body).unwrap_err();
        assert!(matches!(err, ModelError::Api { .. }));
    }
}

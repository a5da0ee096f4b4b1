//! Request building for OpenAI-compatible providers.

use super::stream::OpenAiStreamDecoder;
use super::types::{ChatCompletionResponse, OpenAIError};
use crate::adapter::{ensure_dialect, Adapter};
use crate::catalog::{Dialect, SearchStyle, ThinkingStyle};
use crate::context::{AdapterContext, AdapterResult, RequestPayload};
use crate::decode::{Completion, StreamDecoder};
use crate::error::{ModelError, ModelResult};
use crate::tools::tool_request;
use llmwire_core::builder::local_attachments;
use llmwire_core::{build_messages, inject_attachment_notice, to_chat_messages};
use serde_json::{json, Map, Value};
use tracing::debug;

/// Adapter shared by every OpenAI-compatible provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiAdapter;

impl Adapter for OpenAiAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::OpenAi
    }

    fn build(&self, ctx: &AdapterContext<'_>) -> ModelResult<AdapterResult> {
        ensure_dialect(Dialect::OpenAi, ctx)?;

        let model = ctx.resolve_model();
        let neutral = build_messages(&ctx.effective_params());
        let mut messages = to_chat_messages(&neutral, ctx.provider.as_str());

        let local = local_attachments(&neutral);
        if !local.is_empty() {
            inject_attachment_notice(&mut messages, &local);
        }

        let mut extra_body = Map::new();
        insert_sampling(ctx, &mut extra_body);
        insert_thinking(ctx, &mut extra_body);
        insert_search(ctx, &mut extra_body);

        let tools = tool_request(
            &ctx.config.tools,
            &ctx.params.pending_message,
            !local.is_empty(),
        );

        debug!(
            provider = %ctx.provider,
            model = %model,
            messages = messages.len(),
            local_files = local.len(),
            tools = tools.is_some(),
            "built chat completions request"
        );

        Ok(AdapterResult {
            provider: ctx.provider,
            endpoint: ctx.base_url(),
            model,
            payload: RequestPayload::Chat { messages },
            extra_body,
            tools,
        })
    }

    fn decoder(&self) -> Box<dyn StreamDecoder> {
        Box::new(OpenAiStreamDecoder::new())
    }

    fn extract_completion(&self, body: &Value) -> ModelResult<Completion> {
        if body.get("error").is_some() {
            let err: OpenAIError = serde_json::from_value(body.clone())?;
            return Err(match err.error.code_text() {
                Some(code) => ModelError::api_with_code(err.error.message, code),
                None => ModelError::api(err.error.message),
            });
        }

        let response: ChatCompletionResponse = serde_json::from_value(body.clone())?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::invalid_response("response has no choices"))?;

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            thinking: choice.message.reasoning_content.filter(|r| !r.is_empty()),
            usage: response.usage.map(Into::into),
            tool_calls: choice
                .message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
        })
    }
}

fn insert_sampling(ctx: &AdapterContext<'_>, body: &mut Map<String, Value>) {
    let sampling = ctx.config.sampling();
    if let Some(temperature) = sampling.temperature {
        body.insert("temperature".into(), json!(temperature));
    }
    if let Some(top_p) = sampling.top_p {
        body.insert("top_p".into(), json!(top_p));
    }
    if let Some(top_k) = sampling.top_k.filter(|_| ctx.spec().accepts_top_k) {
        body.insert("top_k".into(), json!(top_k));
    }
    if let Some(max_tokens) = ctx.config.max_tokens {
        body.insert("max_tokens".into(), json!(max_tokens));
    }
}

fn insert_thinking(ctx: &AdapterContext<'_>, body: &mut Map<String, Value>) {
    let active = ctx.thinking_active();
    let settings = &ctx.config.thinking;

    match ctx.spec().thinking {
        ThinkingStyle::ReasoningEffort if active => {
            body.insert(
                "reasoning_effort".into(),
                json!(settings.reasoning_effort().as_str()),
            );
        }
        ThinkingStyle::EffortObject if active => {
            body.insert(
                "reasoning".into(),
                json!({"effort": settings.reasoning_effort().as_str()}),
            );
        }
        ThinkingStyle::ThinkingType => {
            let kind = if active { "enabled" } else { "disabled" };
            body.insert("thinking".into(), json!({"type": kind}));
        }
        ThinkingStyle::EnableThinking => {
            body.insert("enable_thinking".into(), json!(active));
            if active {
                body.insert("thinking_budget".into(), json!(settings.resolve_budget()));
            }
        }
        ThinkingStyle::ThinkFlag => {
            body.insert("think".into(), json!(active));
        }
        ThinkingStyle::ReasoningEffort
        | ThinkingStyle::EffortObject
        | ThinkingStyle::ModelSwap { .. } => {}
        ThinkingStyle::BudgetTokens | ThinkingStyle::ThinkingConfig | ThinkingStyle::None => {
            if active {
                debug!(provider = %ctx.provider, "provider has no thinking control, ignoring toggle");
            }
        }
    }
}

fn insert_search(ctx: &AdapterContext<'_>, body: &mut Map<String, Value>) {
    if !ctx.params.use_search {
        return;
    }
    match ctx.spec().search {
        SearchStyle::EnableSearch => {
            body.insert("enable_search".into(), json!(true));
        }
        SearchStyle::WebPlugin => {
            body.insert("plugins".into(), json!([{"id": "web"}]));
        }
        SearchStyle::GoogleSearchTool | SearchStyle::None => {
            debug!(provider = %ctx.provider, "web search not supported, ignoring toggle");
        }
    }
}

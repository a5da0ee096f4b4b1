//! Request building for Google `generateContent`.

use super::stream::GoogleStreamDecoder;
use super::types::{Content, GenerateContentResponse, GenerationConfig, GoogleError, Part, ThinkingConfig};
use crate::adapter::{ensure_dialect, Adapter};
use crate::catalog::{Dialect, SearchStyle};
use crate::context::{AdapterContext, AdapterResult, RequestPayload};
use crate::decode::{Completion, StreamDecoder};
use crate::error::{ModelError, ModelResult};
use llmwire_core::{
    build_messages, BuildParams, ConversationMessage, FunctionCall, NeutralMessage, NeutralRole,
    Role, ToolCall,
};
use serde_json::{json, Map, Value};
use tracing::debug;

/// MIME type sent when a file reference carries none.
const DEFAULT_MIME: &str = "application/octet-stream";

/// Adapter for Google.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleAdapter;

impl Adapter for GoogleAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Google
    }

    fn build(&self, ctx: &AdapterContext<'_>) -> ModelResult<AdapterResult> {
        ensure_dialect(Dialect::Google, ctx)?;

        let model = ctx.resolve_model();
        let params = with_pending_turn(&ctx.effective_params());
        let neutral = build_messages(&params);
        let tag = ctx.provider.as_str();

        let system: Vec<&str> = neutral
            .iter()
            .filter(|m| m.role == NeutralRole::System)
            .map(|m| m.content.as_str())
            .collect();
        let system_instruction = (!system.is_empty()).then(|| Content::system(system.join("\n\n")));

        let contents: Vec<Content> = neutral
            .iter()
            .filter(|m| m.role != NeutralRole::System)
            .map(|m| to_content(m, tag))
            .collect();

        let sampling = ctx.config.sampling();
        let generation = GenerationConfig {
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            top_k: sampling.top_k,
            max_output_tokens: ctx.config.max_tokens,
            thinking_config: thinking_config(ctx, &model),
        };

        let mut extra_body = Map::new();
        if !generation.is_empty() {
            extra_body.insert("generationConfig".into(), serde_json::to_value(&generation)?);
        }
        if ctx.params.use_search {
            match ctx.spec().search {
                SearchStyle::GoogleSearchTool => {
                    extra_body.insert("tools".into(), json!([{"google_search": {}}]));
                }
                _ => debug!(provider = %ctx.provider, "web search not supported, ignoring toggle"),
            }
        }

        debug!(
            provider = %ctx.provider,
            model = %model,
            contents = contents.len(),
            thinking = ctx.thinking_active(),
            "built generateContent request"
        );

        Ok(AdapterResult {
            provider: ctx.provider,
            endpoint: ctx.base_url(),
            model,
            payload: RequestPayload::Google {
                system_instruction,
                contents,
            },
            extra_body,
            tools: None,
        })
    }

    fn decoder(&self) -> Box<dyn StreamDecoder> {
        Box::new(GoogleStreamDecoder::new())
    }

    fn extract_completion(&self, body: &Value) -> ModelResult<Completion> {
        if body.get("error").is_some() {
            let err: GoogleError = serde_json::from_value(body.clone())?;
            let code = err
                .error
                .status
                .unwrap_or_else(|| err.error.code.to_string());
            return Err(ModelError::api_with_code(err.error.message, code));
        }

        let response: GenerateContentResponse = serde_json::from_value(body.clone())?;
        if response.candidates.is_empty() {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(ModelError::invalid_response(format!("response blocked: {reason}")));
        }

        let mut completion = Completion {
            usage: response.usage_metadata.map(Into::into),
            ..Completion::default()
        };
        let mut thinking = String::new();

        let parts = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        for (idx, part) in parts.into_iter().enumerate() {
            if let Some(call) = part.function_call {
                completion.tool_calls.push(ToolCall {
                    id: format!("call_{idx}"),
                    tool_type: "function".to_string(),
                    function: FunctionCall {
                        name: call.name,
                        arguments: call.args.to_string(),
                    },
                });
            } else if let Some(text) = part.text {
                if part.thought.unwrap_or(false) {
                    thinking.push_str(&text);
                } else {
                    completion.text.push_str(&text);
                }
            }
        }

        completion.thinking = (!thinking.is_empty()).then_some(thinking);
        Ok(completion)
    }
}

/// Append the pending message as a turn unless the history already ends with it.
/// Gemini 2.5 models think by default. Flash variants accept a zero
/// budget to switch it off; Pro models cannot disable thinking.
fn thinking_config(ctx: &AdapterContext<'_>, model: &str) -> Option<ThinkingConfig> {
    if ctx.thinking_active() {
        return Some(ThinkingConfig {
            thinking_budget: ctx.config.thinking.resolve_budget(),
            include_thoughts: true,
        });
    }
    model
        .to_ascii_lowercase()
        .contains("2.5-flash")
        .then_some(ThinkingConfig {
            thinking_budget: 0,
            include_thoughts: false,
        })
}

fn with_pending_turn(params: &BuildParams) -> BuildParams {
    let pending = params.pending_message.trim();
    let already_last = params
        .history
        .last()
        .is_some_and(|m| m.role == Role::User && m.content.trim() == pending);

    let mut params = params.clone();
    if !already_last && !pending.is_empty() {
        params.history.push(
            ConversationMessage::user(params.pending_message.clone())
                .with_attachments(params.pending_attachments.clone()),
        );
    }
    params
}

fn to_content(msg: &NeutralMessage, tag: &str) -> Content {
    let role = match msg.role {
        NeutralRole::Assistant => "model",
        NeutralRole::User | NeutralRole::System => "user",
    };

    let mut parts = Vec::with_capacity(msg.attachments.len() + 1);
    if !msg.content.is_empty() {
        parts.push(Part::text(msg.content.clone()));
    }
    parts.extend(msg.attachments_for(tag).filter_map(|f| {
        f.locator().map(|uri| {
            Part::file_data(f.mime_type.as_deref().unwrap_or(DEFAULT_MIME), uri)
        })
    }));
    if parts.is_empty() {
        parts.push(Part::text(""));
    }

    Content::with_parts(role, parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmwire_core::{FileReference, ProviderConfig, ProviderKind, ThinkingLevel, ThinkingSettings};
    use pretty_assertions::assert_eq;

    fn build(params: &BuildParams, config: &ProviderConfig) -> AdapterResult {
        GoogleAdapter
            .build(&AdapterContext::new(ProviderKind::Google, params, config))
            .unwrap()
    }

    fn contents(result: &AdapterResult) -> &[Content] {
        match &result.payload {
            RequestPayload::Google { contents, .. } => contents,
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_no_duplicate_trailing_user_turn() {
        let history = vec![
            ConversationMessage::user("first"),
            ConversationMessage::model("reply"),
            ConversationMessage::user("second"),
        ];
        let params = BuildParams::new("second").history(history.clone());
        assert_eq!(contents(&build(&params, &ProviderConfig::default())).len(), 3);

        let params = BuildParams::new("third").history(history);
        let result = build(&params, &ProviderConfig::default());
        let contents = contents(&result);
        assert_eq!(contents.len(), 4);
        assert_eq!(contents[3], Content::user("third"));
    }

    #[test]
    fn test_pending_appended_after_model_turn() {
        let history = vec![ConversationMessage::user("same"), ConversationMessage::model("ok")];
        let params = BuildParams::new("same").history(history);
        let result = build(&params, &ProviderConfig::default());
        assert_eq!(contents(&result).len(), 3);
    }

    #[test]
    fn test_file_parts_only_for_google() {
        let params = BuildParams::new("Describe").attachments(vec![
            FileReference::with_uri("google", "https://files/abc", "a.png").mime("image/png"),
            FileReference::with_id("openai", "file-1", "b.pdf"),
        ]);
        let result = build(&params, &ProviderConfig::default());
        assert_eq!(
            contents(&result)[0],
            Content::with_parts(
                "user",
                vec![
                    Part::text("Describe"),
                    Part::file_data("image/png", "https://files/abc"),
                ]
            )
        );
    }

    #[test]
    fn test_generation_config_and_search_tool() {
        let config = ProviderConfig::default()
            .with_temperature(0.5)
            .with_thinking(ThinkingSettings::with_level(ThinkingLevel::High));
        let params = BuildParams::new("q").search(true).language("German");
        let result = build(&params, &config);
        let body = result.to_body(true).unwrap();

        assert_eq!(
            body["generationConfig"],
            json!({
                "temperature": 0.5,
                "thinkingConfig": {"thinkingBudget": 4096, "includeThoughts": true}
            })
        );
        assert_eq!(body["tools"], json!([{"google_search": {}}]));
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("German"));
        assert!(body.get("model").is_none());
    }

    #[test]
    fn test_thinking_off_sends_zero_budget_on_flash() {
        let params = BuildParams::new("q");
        let body = build(&params, &ProviderConfig::default()).to_body(true).unwrap();
        assert_eq!(
            body["generationConfig"],
            json!({"thinkingConfig": {"thinkingBudget": 0, "includeThoughts": false}})
        );

        let body = build(&params, &ProviderConfig::new("gemini-2.5-pro"))
            .to_body(true)
            .unwrap();
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_provider_thinking_keeps_summary_instruction() {
        let params = BuildParams::new("q").thinking_summary(true);
        let config = ProviderConfig::default().with_thinking(ThinkingSettings {
            enabled: true,
            ..ThinkingSettings::default()
        });
        let result = build(&params, &config);
        let text = serde_json::to_string(contents(&result)).unwrap();
        assert!(text.contains("<thinking_summary>"));
    }

    #[test]
    fn test_extract_completion() {
        let body = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "Planning", "thought": true},
                    {"text": "Result"}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 2, "totalTokenCount": 6}
        });
        let completion = GoogleAdapter.extract_completion(&body).unwrap();
        assert_eq!(completion.text, "Result");
        assert_eq!(completion.thinking.as_deref(), Some("Planning"));
        assert_eq!(completion.usage.unwrap().total_tokens, 6);
    }

    #[test]
    fn test_blocked_prompt() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = GoogleAdapter.extract_completion(&body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}

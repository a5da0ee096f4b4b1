//! Adapter inputs and outputs.
//!
//! An [`AdapterContext`] borrows the caller's read-only inputs; an
//! [`AdapterResult`] is the provider-ready payload the request pipeline
//! sends. Results are built fresh per request and never mutated: follow-up
//! requests derive a new value with [`AdapterResult::with_tool_exchange`].

use crate::anthropic::types::AnthropicMessage;
use crate::catalog::{spec, Dialect, ProviderSpec, ThinkingStyle};
use crate::error::{ModelError, ModelResult};
use crate::google::types::Content;
use llmwire_core::{BuildParams, ChatMessage, ChatTool, ProviderConfig, ProviderKind};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::borrow::Cow;

/// Inputs to one adapter call.
#[derive(Debug, Clone, Copy)]
pub struct AdapterContext<'a> {
    /// Target provider.
    pub provider: ProviderKind,
    /// Conversation parameters.
    pub params: &'a BuildParams,
    /// Resolved provider configuration.
    pub config: &'a ProviderConfig,
    /// Model override; falls back to the configured model.
    pub model: Option<&'a str>,
}

impl<'a> AdapterContext<'a> {
    /// Create a context.
    pub fn new(provider: ProviderKind, params: &'a BuildParams, config: &'a ProviderConfig) -> Self {
        Self {
            provider,
            params,
            config,
            model: None,
        }
    }

    /// Target a specific model.
    #[must_use]
    pub fn with_model(mut self, model: &'a str) -> Self {
        self.model = Some(model);
        self
    }

    /// Static facts about the provider.
    #[must_use]
    pub fn spec(&self) -> &'static ProviderSpec {
        spec(self.provider)
    }

    /// Whether this request should think.
    ///
    /// Either the per-turn toggle or the provider setting turns it on.
    #[must_use]
    pub fn thinking_active(&self) -> bool {
        self.params.use_thinking || self.config.thinking.enabled
    }

    /// Turn parameters with `use_thinking` matching [`Self::thinking_active`].
    ///
    /// Message building keys the thinking-summary instruction off this flag.
    #[must_use]
    pub fn effective_params(&self) -> Cow<'a, BuildParams> {
        if self.params.use_thinking || !self.thinking_active() {
            Cow::Borrowed(self.params)
        } else {
            Cow::Owned(BuildParams {
                use_thinking: true,
                ..self.params.clone()
            })
        }
    }

    /// Whether any message carries a local-file attachment.
    #[must_use]
    pub fn has_local_attachments(&self) -> bool {
        self.params.pending_attachments.iter().any(|f| f.is_local())
            || self
                .params
                .history
                .iter()
                .flat_map(|m| m.attachments.iter())
                .any(|f| f.is_local())
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(self.spec().base_url)
            .trim_end_matches('/')
            .to_string()
    }

    /// Pick the concrete model id.
    ///
    /// Providers that serve thinking from a separate model swap between the
    /// two ids, but only when the configured model is empty or one of them.
    #[must_use]
    pub fn resolve_model(&self) -> String {
        let configured = self
            .model
            .unwrap_or(self.config.model.as_str())
            .trim();
        let spec = self.spec();

        if let ThinkingStyle::ModelSwap {
            default,
            thinking,
            default_with_local_files,
        } = spec.thinking
        {
            if configured.is_empty() || configured == default || configured == thinking {
                if default_with_local_files && self.has_local_attachments() {
                    return default.to_string();
                }
                return if self.thinking_active() { thinking } else { default }.to_string();
            }
        }

        if configured.is_empty() {
            spec.default_model.to_string()
        } else {
            configured.to_string()
        }
    }
}

/// Tools offered on the tool-resolution call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolRequest {
    /// Tool definitions.
    pub tools: Vec<ChatTool>,
    /// `tool_choice` value.
    pub tool_choice: Value,
}

/// Dialect-specific message list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestPayload {
    /// OpenAI-style chat messages.
    Chat {
        /// Messages.
        messages: Vec<ChatMessage>,
    },
    /// Anthropic messages with a separate system prompt.
    Anthropic {
        /// System prompt.
        #[serde(skip_serializing_if = "Option::is_none")]
        system: Option<String>,
        /// Messages.
        messages: Vec<AnthropicMessage>,
    },
    /// Google contents with a separate system instruction.
    Google {
        /// System instruction.
        #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
        system_instruction: Option<Content>,
        /// Contents.
        contents: Vec<Content>,
    },
}

impl RequestPayload {
    /// Dialect of this payload.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::Chat { .. } => Dialect::OpenAi,
            Self::Anthropic { .. } => Dialect::Anthropic,
            Self::Google { .. } => Dialect::Google,
        }
    }
}

/// A provider-ready request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterResult {
    /// Provider.
    pub provider: ProviderKind,
    /// API base URL.
    pub endpoint: String,
    /// Concrete model id.
    pub model: String,
    /// Messages or contents.
    pub payload: RequestPayload,
    /// Generation parameters, thinking toggle and search options.
    pub extra_body: Map<String, Value>,
    /// Tools for the resolution call, when the request is eligible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolRequest>,
}

impl AdapterResult {
    /// Dialect of this request.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.payload.dialect()
    }

    /// Full request URL.
    #[must_use]
    pub fn url(&self, stream: bool) -> String {
        match self.dialect() {
            Dialect::OpenAi => format!("{}/chat/completions", self.endpoint),
            Dialect::Anthropic => format!("{}/messages", self.endpoint),
            Dialect::Google if stream => format!(
                "{}/models/{}:streamGenerateContent?alt=sse",
                self.endpoint, self.model
            ),
            Dialect::Google => format!("{}/models/{}:generateContent", self.endpoint, self.model),
        }
    }

    /// JSON request body, without tools.
    pub fn to_body(&self, stream: bool) -> ModelResult<Value> {
        let Value::Object(mut body) = serde_json::to_value(&self.payload)? else {
            return Err(ModelError::Other(anyhow::anyhow!(
                "request payload did not serialize to an object"
            )));
        };

        match self.dialect() {
            Dialect::OpenAi => {
                body.insert("model".into(), json!(self.model));
                body.insert("stream".into(), json!(stream));
                if stream {
                    body.insert("stream_options".into(), json!({"include_usage": true}));
                }
            }
            Dialect::Anthropic => {
                body.insert("model".into(), json!(self.model));
                body.insert("stream".into(), json!(stream));
            }
            Dialect::Google => {}
        }

        body.extend(self.extra_body.clone());
        Ok(Value::Object(body))
    }

    /// Non-streaming body for the tool-resolution call, if tools apply.
    pub fn tool_resolution_body(&self) -> ModelResult<Option<Value>> {
        let Some(tools) = &self.tools else {
            return Ok(None);
        };
        let mut body = self.to_body(false)?;
        if let Value::Object(map) = &mut body {
            map.insert("tools".into(), serde_json::to_value(&tools.tools)?);
            map.insert("tool_choice".into(), tools.tool_choice.clone());
        }
        Ok(Some(body))
    }

    /// Derive the follow-up request carrying a completed tool exchange.
    ///
    /// The new request offers no tools.
    pub fn with_tool_exchange(
        &self,
        assistant: ChatMessage,
        results: Vec<ChatMessage>,
    ) -> ModelResult<Self> {
        let RequestPayload::Chat { messages } = &self.payload else {
            return Err(ModelError::DialectMismatch {
                adapter: Dialect::OpenAi.name(),
                provider: self.provider.to_string(),
            });
        };

        let mut messages = messages.clone();
        messages.push(assistant);
        messages.extend(results);

        Ok(Self {
            payload: RequestPayload::Chat { messages },
            tools: None,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmwire_core::{ConversationMessage, FileReference, ThinkingSettings};
    use pretty_assertions::assert_eq;

    fn chat_result() -> AdapterResult {
        AdapterResult {
            provider: ProviderKind::OpenAI,
            endpoint: "https://api.openai.com/v1".into(),
            model: "gpt-4o".into(),
            payload: RequestPayload::Chat {
                messages: vec![ChatMessage::user("hi")],
            },
            extra_body: Map::from_iter([("temperature".to_string(), json!(0.2))]),
            tools: None,
        }
    }

    #[test]
    fn test_model_swap_follows_thinking() {
        let params = BuildParams::new("q").thinking(true);
        let config = ProviderConfig::default();
        let ctx = AdapterContext::new(ProviderKind::DeepSeek, &params, &config);
        assert_eq!(ctx.resolve_model(), "deepseek-reasoner");

        let params = BuildParams::new("q");
        let ctx = AdapterContext::new(ProviderKind::Moonshot, &params, &config);
        assert_eq!(ctx.resolve_model(), "kimi-k2-0905-preview");
    }

    #[test]
    fn test_model_swap_keeps_custom_model() {
        let params = BuildParams::new("q").thinking(true);
        let config = ProviderConfig::new("deepseek-v3-custom");
        let ctx = AdapterContext::new(ProviderKind::DeepSeek, &params, &config);
        assert_eq!(ctx.resolve_model(), "deepseek-v3-custom");
    }

    #[test]
    fn test_local_files_force_default_model_for_deepseek_only() {
        let history = vec![ConversationMessage::user("read")
            .with_attachments(vec![FileReference::local("/tmp/a.txt", "a.txt")])];
        let params = BuildParams::new("read").history(history).thinking(true);
        let config = ProviderConfig::new("deepseek-reasoner");

        let ctx = AdapterContext::new(ProviderKind::DeepSeek, &params, &config);
        assert_eq!(ctx.resolve_model(), "deepseek-chat");

        let config = ProviderConfig::default();
        let ctx = AdapterContext::new(ProviderKind::Moonshot, &params, &config);
        assert_eq!(ctx.resolve_model(), "kimi-k2-thinking");
    }

    #[test]
    fn test_provider_setting_enables_thinking() {
        let params = BuildParams::new("q");
        let config = ProviderConfig::default().with_thinking(ThinkingSettings {
            enabled: true,
            ..ThinkingSettings::default()
        });
        let ctx = AdapterContext::new(ProviderKind::Moonshot, &params, &config);
        assert!(ctx.thinking_active());
        assert_eq!(ctx.resolve_model(), "kimi-k2-thinking");
    }

    #[test]
    fn test_effective_params_follow_provider_thinking() {
        let params = BuildParams::new("q").thinking_summary(true);
        let config = ProviderConfig::default().with_thinking(ThinkingSettings {
            enabled: true,
            ..ThinkingSettings::default()
        });
        let ctx = AdapterContext::new(ProviderKind::OpenAI, &params, &config);
        assert!(ctx.effective_params().wants_thinking_summary());

        let plain = ProviderConfig::default();
        let ctx = AdapterContext::new(ProviderKind::OpenAI, &params, &plain);
        assert!(matches!(ctx.effective_params(), Cow::Borrowed(_)));
        assert!(!ctx.effective_params().wants_thinking_summary());
    }

    #[test]
    fn test_override_model_and_base_url() {
        let params = BuildParams::new("q");
        let config = ProviderConfig::new("gpt-4o").with_base_url("http://localhost:8080/v1/");
        let ctx = AdapterContext::new(ProviderKind::OpenAI, &params, &config).with_model("o3");
        assert_eq!(ctx.resolve_model(), "o3");
        assert_eq!(ctx.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_chat_body() {
        let body = chat_result().to_body(true).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": true,
                "stream_options": {"include_usage": true},
                "temperature": 0.2
            })
        );
    }

    #[test]
    fn test_google_url() {
        let result = AdapterResult {
            provider: ProviderKind::Google,
            endpoint: "https://g.example/v1beta".into(),
            model: "gemini-2.5-flash".into(),
            payload: RequestPayload::Google {
                system_instruction: None,
                contents: Vec::new(),
            },
            extra_body: Map::new(),
            tools: None,
        };
        assert_eq!(
            result.url(true),
            "https://g.example/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
        assert_eq!(
            result.url(false),
            "https://g.example/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(result.to_body(false).unwrap(), json!({"contents": []}));
    }

    #[test]
    fn test_tool_exchange_derives_new_request() {
        let mut original = chat_result();
        original.tools = Some(ToolRequest {
            tools: Vec::new(),
            tool_choice: json!("auto"),
        });

        let body = original.tool_resolution_body().unwrap().unwrap();
        assert_eq!(body["stream"], json!(false));
        assert_eq!(body["tool_choice"], json!("auto"));

        let next = original
            .with_tool_exchange(
                ChatMessage::assistant_tool_calls(Vec::new()),
                vec![ChatMessage::tool("call_1", "12:00")],
            )
            .unwrap();
        assert!(next.tools.is_none());
        assert!(next.tool_resolution_body().unwrap().is_none());
        match (&original.payload, &next.payload) {
            (RequestPayload::Chat { messages: a }, RequestPayload::Chat { messages: b }) => {
                assert_eq!(a.len(), 1);
                assert_eq!(b.len(), 3);
            }
            _ => panic!("expected chat payloads"),
        }
    }
}

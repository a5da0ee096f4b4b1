//! Provider configuration.
//!
//! A [`ProviderConfig`] arrives fully resolved from the settings layer and is
//! treated as read-only by everything downstream.

use crate::errors::{CoreError, Result};
use crate::provider::ProviderKind;
use serde::{Deserialize, Serialize};

/// Symbolic thinking level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThinkingLevel {
    /// Light reasoning.
    Low,
    /// Default reasoning depth.
    #[default]
    Medium,
    /// Deep reasoning.
    High,
}

impl ThinkingLevel {
    /// Token budget for this level.
    #[must_use]
    pub fn budget(&self) -> i64 {
        match self {
            Self::Low => 1024,
            Self::Medium => 2048,
            Self::High => 4096,
        }
    }

    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// OpenAI-style reasoning effort.
pub type ReasoningEffort = ThinkingLevel;

/// Thinking/reasoning settings for one provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThinkingSettings {
    /// Whether the provider may think at all.
    pub enabled: bool,
    /// Symbolic level, `medium` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<ThinkingLevel>,
    /// Explicit token budget. Only used when finite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
}

impl ThinkingSettings {
    /// Enabled thinking at the given level.
    #[must_use]
    pub fn with_level(level: ThinkingLevel) -> Self {
        Self {
            enabled: true,
            level: Some(level),
            budget: None,
        }
    }

    /// Set an explicit token budget.
    #[must_use]
    pub fn budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    fn explicit_budget(&self) -> Option<f64> {
        self.budget.filter(|b| b.is_finite())
    }

    /// Resolve the numeric token budget.
    ///
    /// A finite explicit budget wins verbatim; otherwise the level table applies.
    #[must_use]
    pub fn resolve_budget(&self) -> i64 {
        match self.explicit_budget() {
            Some(budget) => budget.trunc() as i64,
            None => self.level.unwrap_or_default().budget(),
        }
    }

    /// Resolve the OpenAI-style reasoning effort.
    ///
    /// An explicit budget is bucketed: up to 1024 is low, up to 4096 is
    /// medium, anything larger is high.
    #[must_use]
    pub fn reasoning_effort(&self) -> ReasoningEffort {
        match self.explicit_budget() {
            Some(budget) if budget <= 1024.0 => ThinkingLevel::Low,
            Some(budget) if budget <= 4096.0 => ThinkingLevel::Medium,
            Some(_) => ThinkingLevel::High,
            None => self.level.unwrap_or_default(),
        }
    }
}

/// Which tool the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the model decide.
    #[default]
    Auto,
    /// Never call tools.
    None,
    /// Always call a tool.
    Required,
    /// Call the tool named in [`ToolPermissions::specific_tool`].
    Specific,
}

/// Tool permissions for one provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolPermissions {
    /// Master switch.
    pub enabled: bool,
    /// Tool choice strategy.
    pub tool_choice: ToolChoice,
    /// Tool name when `tool_choice` is `specific`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_tool: Option<String>,
}

impl ToolPermissions {
    /// Whether the given tool has been requested by name.
    #[must_use]
    pub fn names(&self, tool: &str) -> bool {
        self.tool_choice == ToolChoice::Specific && self.specific_tool.as_deref() == Some(tool)
    }
}

/// Sampling parameters after applying the advanced-params gate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sampling {
    /// Temperature.
    pub temperature: Option<f64>,
    /// Nucleus sampling.
    pub top_p: Option<f64>,
    /// Top-k sampling.
    pub top_k: Option<u64>,
}

/// Resolved configuration for one provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderConfig {
    /// API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL override.
    #[serde(skip_serializing_if = "Option::is_none", alias = "apiUrl")]
    pub base_url: Option<String>,
    /// Model name. Empty selects the provider default.
    pub model: String,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling, honoured only with `show_advanced_params`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Top-k sampling, honoured only with `show_advanced_params`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u64>,
    /// Gate for `top_p`/`top_k`.
    pub show_advanced_params: bool,
    /// Maximum output tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
    /// Thinking settings.
    pub thinking: ThinkingSettings,
    /// Tool permissions.
    pub tools: ToolPermissions,
}

impl ProviderConfig {
    /// Create a config for the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Read `<PROVIDER>_API_KEY` and `<PROVIDER>_BASE_URL` from the environment.
    pub fn from_env(provider: ProviderKind) -> Self {
        let prefix = provider.env_prefix();
        Self {
            api_key: std::env::var(format!("{prefix}_API_KEY")).ok(),
            base_url: std::env::var(format!("{prefix}_BASE_URL")).ok(),
            ..Self::default()
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set thinking settings.
    #[must_use]
    pub fn with_thinking(mut self, thinking: ThinkingSettings) -> Self {
        self.thinking = thinking;
        self
    }

    /// Set tool permissions.
    #[must_use]
    pub fn with_tools(mut self, tools: ToolPermissions) -> Self {
        self.tools = tools;
        self
    }

    /// Sampling parameters; `top_p`/`top_k` are dropped unless advanced params are shown.
    #[must_use]
    pub fn sampling(&self) -> Sampling {
        Sampling {
            temperature: self.temperature,
            top_p: self.top_p.filter(|_| self.show_advanced_params),
            top_k: self.top_k.filter(|_| self.show_advanced_params),
        }
    }

    /// The API key, or a configuration error naming the provider.
    pub fn require_api_key(&self, provider: ProviderKind) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(CoreError::missing(format!("API key for {provider}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ThinkingLevel::Low, 1024)]
    #[case(ThinkingLevel::Medium, 2048)]
    #[case(ThinkingLevel::High, 4096)]
    fn test_level_budget_table(#[case] level: ThinkingLevel, #[case] expected: i64) {
        assert_eq!(ThinkingSettings::with_level(level).resolve_budget(), expected);
    }

    #[test]
    fn test_explicit_budget_wins() {
        let settings = ThinkingSettings::with_level(ThinkingLevel::Low).budget(9000.0);
        assert_eq!(settings.resolve_budget(), 9000);
    }

    #[test]
    fn test_non_finite_budget_ignored() {
        let settings = ThinkingSettings::with_level(ThinkingLevel::High).budget(f64::NAN);
        assert_eq!(settings.resolve_budget(), 4096);
        let settings = ThinkingSettings::default().budget(f64::INFINITY);
        assert_eq!(settings.resolve_budget(), 2048);
    }

    #[rstest]
    #[case(512.0, ThinkingLevel::Low)]
    #[case(1024.0, ThinkingLevel::Low)]
    #[case(1025.0, ThinkingLevel::Medium)]
    #[case(4096.0, ThinkingLevel::Medium)]
    #[case(4097.0, ThinkingLevel::High)]
    fn test_effort_buckets(#[case] budget: f64, #[case] expected: ThinkingLevel) {
        let settings = ThinkingSettings::with_level(ThinkingLevel::High).budget(budget);
        assert_eq!(settings.reasoning_effort(), expected);
    }

    #[test]
    fn test_effort_passthrough_defaults_medium() {
        assert_eq!(ThinkingSettings::default().reasoning_effort(), ThinkingLevel::Medium);
        assert_eq!(
            ThinkingSettings::with_level(ThinkingLevel::High).reasoning_effort(),
            ThinkingLevel::High
        );
    }

    #[test]
    fn test_sampling_gate() {
        let mut config = ProviderConfig::new("m").with_temperature(0.3);
        config.top_p = Some(0.9);
        config.top_k = Some(40);
        assert_eq!(config.sampling().top_p, None);
        assert_eq!(config.sampling().top_k, None);

        config.show_advanced_params = true;
        let sampling = config.sampling();
        assert_eq!(sampling.temperature, Some(0.3));
        assert_eq!(sampling.top_p, Some(0.9));
        assert_eq!(sampling.top_k, Some(40));
    }

    #[test]
    fn test_require_api_key() {
        let config = ProviderConfig::new("m").with_api_key("  ");
        let err = config.require_api_key(ProviderKind::Qwen).unwrap_err();
        assert!(err.to_string().contains("qwen"));
        let config = ProviderConfig::new("m").with_api_key("sk-1");
        assert_eq!(config.require_api_key(ProviderKind::Qwen).unwrap(), "sk-1");
    }

    #[test]
    fn test_deserialize_settings_json() {
        let config: ProviderConfig = serde_json::from_str(
            r#"{
                "apiKey": "sk",
                "model": "deepseek-chat",
                "thinking": {"enabled": true, "level": "high"},
                "tools": {"enabled": true, "toolChoice": "specific", "specificTool": "get_current_time"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk"));
        assert_eq!(config.thinking.level, Some(ThinkingLevel::High));
        assert!(config.tools.names("get_current_time"));
        assert!(!config.show_advanced_params);
    }
}

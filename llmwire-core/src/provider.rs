//! Provider identifiers.
//!
//! The set of providers is closed: every identifier the surrounding
//! application can hand us maps onto one [`ProviderKind`] variant, and
//! anything else fails to parse.

use crate::errors::CoreError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A chat-completion provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKind {
    /// OpenAI.
    OpenAI,
    /// DeepSeek.
    DeepSeek,
    /// Alibaba Qwen via DashScope compatible mode.
    Qwen,
    /// Moonshot (Kimi).
    Moonshot,
    /// Zhipu (GLM).
    Zhipu,
    /// ByteDance Doubao via Volcengine Ark.
    Doubao,
    /// SiliconFlow.
    SiliconFlow,
    /// OpenRouter.
    OpenRouter,
    /// Groq.
    Groq,
    /// Mistral.
    Mistral,
    /// xAI (Grok).
    XAi,
    /// Local Ollama server.
    Ollama,
    /// Anthropic Messages API.
    Anthropic,
    /// Google Generative Language API.
    Google,
}

impl ProviderKind {
    /// Every provider, in a stable order.
    pub const ALL: [ProviderKind; 14] = [
        Self::OpenAI,
        Self::DeepSeek,
        Self::Qwen,
        Self::Moonshot,
        Self::Zhipu,
        Self::Doubao,
        Self::SiliconFlow,
        Self::OpenRouter,
        Self::Groq,
        Self::Mistral,
        Self::XAi,
        Self::Ollama,
        Self::Anthropic,
        Self::Google,
    ];

    /// Canonical identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::DeepSeek => "deepseek",
            Self::Qwen => "qwen",
            Self::Moonshot => "moonshot",
            Self::Zhipu => "zhipu",
            Self::Doubao => "doubao",
            Self::SiliconFlow => "siliconflow",
            Self::OpenRouter => "openrouter",
            Self::Groq => "groq",
            Self::Mistral => "mistral",
            Self::XAi => "xai",
            Self::Ollama => "ollama",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
        }
    }

    /// Prefix used for environment variables (`<PREFIX>_API_KEY`).
    #[must_use]
    pub fn env_prefix(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }

    /// Whether the provider speaks the OpenAI chat-completions dialect.
    #[must_use]
    pub fn is_openai_compatible(&self) -> bool {
        !matches!(self, Self::Anthropic | Self::Google)
    }

    /// Whether requests need an API key.
    #[must_use]
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Self::OpenAI,
            "deepseek" => Self::DeepSeek,
            "qwen" | "dashscope" | "tongyi" => Self::Qwen,
            "moonshot" | "kimi" => Self::Moonshot,
            "zhipu" | "glm" | "bigmodel" => Self::Zhipu,
            "doubao" | "volcengine" | "ark" => Self::Doubao,
            "siliconflow" => Self::SiliconFlow,
            "openrouter" => Self::OpenRouter,
            "groq" => Self::Groq,
            "mistral" => Self::Mistral,
            "xai" | "grok" => Self::XAi,
            "ollama" => Self::Ollama,
            "anthropic" | "claude" => Self::Anthropic,
            "google" | "gemini" => Self::Google,
            _ => return Err(CoreError::UnknownProvider(s.to_string())),
        };
        Ok(kind)
    }
}

impl Serialize for ProviderKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

//! Token usage reported at the end of a response.

use serde::{Deserialize, Serialize};

/// Token usage for one response.
///
/// Field names follow the OpenAI usage object; aliases accept the
/// Anthropic and Google spellings so decoders can deserialize directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    #[serde(alias = "input_tokens", alias = "promptTokenCount")]
    pub prompt_tokens: u64,
    /// Tokens in the completion.
    #[serde(alias = "output_tokens", alias = "candidatesTokenCount")]
    pub completion_tokens: u64,
    /// Prompt plus completion.
    #[serde(alias = "totalTokenCount")]
    pub total_tokens: u64,
    /// Prompt tokens served from cache.
    #[serde(
        skip_serializing_if = "Option::is_none",
        alias = "cache_read_input_tokens",
        alias = "cachedContentTokenCount"
    )]
    pub cached_tokens: Option<u64>,
}

impl TokenUsage {
    /// Create usage from prompt and completion counts.
    #[must_use]
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            cached_tokens: None,
        }
    }

    /// Set cached tokens.
    #[must_use]
    pub fn with_cached(mut self, cached: u64) -> Self {
        self.cached_tokens = Some(cached);
        self
    }

    /// Fill `total_tokens` when the provider left it out.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.total_tokens == 0 {
            self.total_tokens = self.prompt_tokens + self.completion_tokens;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_computes_total() {
        let usage = TokenUsage::new(10, 5);
        assert_eq!(usage.total_tokens, 15);
        assert_eq!(usage.cached_tokens, None);
    }

    #[test]
    fn test_anthropic_aliases() {
        let usage: TokenUsage =
            serde_json::from_str(r#"{"input_tokens": 7, "output_tokens": 3}"#).unwrap();
        assert_eq!(usage.normalized(), TokenUsage::new(7, 3));
    }

    #[test]
    fn test_google_aliases() {
        let usage: TokenUsage = serde_json::from_str(
            r#"{"promptTokenCount": 4, "candidatesTokenCount": 6, "totalTokenCount": 12, "cachedContentTokenCount": 2}"#,
        )
        .unwrap();
        assert_eq!(usage.total_tokens, 12);
        assert_eq!(usage.cached_tokens, Some(2));
    }

    #[test]
    fn test_serialize_skips_missing_cache() {
        let json = serde_json::to_string(&TokenUsage::new(1, 2)).unwrap();
        assert_eq!(
            json,
            r#"{"prompt_tokens":1,"completion_tokens":2,"total_tokens":3}"#
        );
    }
}

//! Static per-provider facts: endpoint, wire dialect, and request conventions.

use llmwire_core::ProviderKind;

/// Request/response wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// OpenAI chat completions.
    OpenAi,
    /// Anthropic Messages.
    Anthropic,
    /// Google `generateContent`.
    Google,
}

impl Dialect {
    /// Adapter name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai-chat",
            Self::Anthropic => "anthropic-messages",
            Self::Google => "google-generate-content",
        }
    }
}

/// How a provider is asked to think.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkingStyle {
    /// `reasoning_effort: low|medium|high`.
    ReasoningEffort,
    /// `reasoning: {effort}`.
    EffortObject,
    /// `thinking: {type: enabled|disabled}`.
    ThinkingType,
    /// `enable_thinking` plus `thinking_budget`.
    EnableThinking,
    /// `think: bool`.
    ThinkFlag,
    /// A separate model id serves thinking requests.
    ModelSwap {
        /// Model used without thinking.
        default: &'static str,
        /// Model used with thinking.
        thinking: &'static str,
        /// Force the default model when local files are attached.
        default_with_local_files: bool,
    },
    /// `thinking: {type: enabled, budget_tokens}`.
    BudgetTokens,
    /// `generationConfig.thinkingConfig`.
    ThinkingConfig,
    /// No thinking control.
    None,
}

/// How a provider enables web search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStyle {
    /// `enable_search: true`.
    EnableSearch,
    /// A `google_search` tool entry.
    GoogleSearchTool,
    /// `plugins: [{id: "web"}]`.
    WebPlugin,
    /// Not supported.
    None,
}

/// Everything an adapter needs to know about a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSpec {
    /// Provider.
    pub kind: ProviderKind,
    /// Wire dialect.
    pub dialect: Dialect,
    /// Default API base URL.
    pub base_url: &'static str,
    /// Model used when none is configured.
    pub default_model: &'static str,
    /// Thinking convention.
    pub thinking: ThinkingStyle,
    /// Search convention.
    pub search: SearchStyle,
    /// Whether the endpoint accepts `top_k`.
    pub accepts_top_k: bool,
}

const fn openai_style(
    kind: ProviderKind,
    base_url: &'static str,
    default_model: &'static str,
    thinking: ThinkingStyle,
) -> ProviderSpec {
    ProviderSpec {
        kind,
        dialect: Dialect::OpenAi,
        base_url,
        default_model,
        thinking,
        search: SearchStyle::None,
        accepts_top_k: false,
    }
}

static OPENAI: ProviderSpec = openai_style(
    ProviderKind::OpenAI,
    "https://api.openai.com/v1",
    "gpt-4o",
    ThinkingStyle::ReasoningEffort,
);

static DEEPSEEK: ProviderSpec = openai_style(
    ProviderKind::DeepSeek,
    "https://api.deepseek.com/v1",
    "deepseek-chat",
    ThinkingStyle::ModelSwap {
        default: "deepseek-chat",
        thinking: "deepseek-reasoner",
        default_with_local_files: true,
    },
);

static QWEN: ProviderSpec = ProviderSpec {
    search: SearchStyle::EnableSearch,
    accepts_top_k: true,
    ..openai_style(
        ProviderKind::Qwen,
        "https://dashscope.aliyuncs.com/compatible-mode/v1",
        "qwen-plus",
        ThinkingStyle::EnableThinking,
    )
};

static MOONSHOT: ProviderSpec = openai_style(
    ProviderKind::Moonshot,
    "https://api.moonshot.cn/v1",
    "kimi-k2-0905-preview",
    ThinkingStyle::ModelSwap {
        default: "kimi-k2-0905-preview",
        thinking: "kimi-k2-thinking",
        default_with_local_files: false,
    },
);

static ZHIPU: ProviderSpec = openai_style(
    ProviderKind::Zhipu,
    "https://open.bigmodel.cn/api/paas/v4",
    "glm-4.6",
    ThinkingStyle::ThinkingType,
);

static DOUBAO: ProviderSpec = openai_style(
    ProviderKind::Doubao,
    "https://ark.cn-beijing.volces.com/api/v3",
    "doubao-seed-1-6-250615",
    ThinkingStyle::ThinkingType,
);

static SILICONFLOW: ProviderSpec = ProviderSpec {
    accepts_top_k: true,
    ..openai_style(
        ProviderKind::SiliconFlow,
        "https://api.siliconflow.cn/v1",
        "Qwen/Qwen3-8B",
        ThinkingStyle::EnableThinking,
    )
};

static OPENROUTER: ProviderSpec = ProviderSpec {
    search: SearchStyle::WebPlugin,
    accepts_top_k: true,
    ..openai_style(
        ProviderKind::OpenRouter,
        "https://openrouter.ai/api/v1",
        "openai/gpt-4o-mini",
        ThinkingStyle::EffortObject,
    )
};

static GROQ: ProviderSpec = openai_style(
    ProviderKind::Groq,
    "https://api.groq.com/openai/v1",
    "llama-3.3-70b-versatile",
    ThinkingStyle::ReasoningEffort,
);

static MISTRAL: ProviderSpec = openai_style(
    ProviderKind::Mistral,
    "https://api.mistral.ai/v1",
    "mistral-large-latest",
    ThinkingStyle::None,
);

static XAI: ProviderSpec = openai_style(
    ProviderKind::XAi,
    "https://api.x.ai/v1",
    "grok-4",
    ThinkingStyle::ReasoningEffort,
);

static OLLAMA: ProviderSpec = ProviderSpec {
    accepts_top_k: true,
    ..openai_style(
        ProviderKind::Ollama,
        "http://localhost:11434/v1",
        "llama3.2",
        ThinkingStyle::ThinkFlag,
    )
};

static ANTHROPIC: ProviderSpec = ProviderSpec {
    kind: ProviderKind::Anthropic,
    dialect: Dialect::Anthropic,
    base_url: "https://api.anthropic.com/v1",
    default_model: "claude-sonnet-4-5",
    thinking: ThinkingStyle::BudgetTokens,
    search: SearchStyle::None,
    accepts_top_k: true,
};

static GOOGLE: ProviderSpec = ProviderSpec {
    kind: ProviderKind::Google,
    dialect: Dialect::Google,
    base_url: "https://generativelanguage.googleapis.com/v1beta",
    default_model: "gemini-2.5-flash",
    thinking: ThinkingStyle::ThinkingConfig,
    search: SearchStyle::GoogleSearchTool,
    accepts_top_k: true,
};

/// Look up a provider's spec. Total over [`ProviderKind`].
#[must_use]
pub fn spec(kind: ProviderKind) -> &'static ProviderSpec {
    match kind {
        ProviderKind::OpenAI => &OPENAI,
        ProviderKind::DeepSeek => &DEEPSEEK,
        ProviderKind::Qwen => &QWEN,
        ProviderKind::Moonshot => &MOONSHOT,
        ProviderKind::Zhipu => &ZHIPU,
        ProviderKind::Doubao => &DOUBAO,
        ProviderKind::SiliconFlow => &SILICONFLOW,
        ProviderKind::OpenRouter => &OPENROUTER,
        ProviderKind::Groq => &GROQ,
        ProviderKind::Mistral => &MISTRAL,
        ProviderKind::XAi => &XAI,
        ProviderKind::Ollama => &OLLAMA,
        ProviderKind::Anthropic => &ANTHROPIC,
        ProviderKind::Google => &GOOGLE,
    }
}

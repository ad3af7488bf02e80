//! Provider registry — the closed set of supported providers.
//!
//! Each `ProviderSpec` describes how to reach one vendor: its config/env key,
//! fixed endpoint, model id, and which wire format its API speaks. Adding a
//! provider means adding a `ProviderKind` variant; nothing is discovered at
//! runtime.

use std::fmt;
use std::str::FromStr;

use crate::chat_completions::ChatCompletionsAdapter;
use crate::dashscope::DashScopeAdapter;
use crate::error::DispatchError;
use crate::traits::ProviderAdapter;

// ─────────────────────────────────────────────
// ProviderKind
// ─────────────────────────────────────────────

/// One of the supported providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    DeepSeek,
    Zhipu,
    Qwen,
    Kimi,
}

impl ProviderKind {
    /// All providers, in registry order.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::DeepSeek,
        ProviderKind::Zhipu,
        ProviderKind::Qwen,
        ProviderKind::Kimi,
    ];

    /// Static metadata for this provider.
    pub fn spec(self) -> &'static ProviderSpec {
        match self {
            ProviderKind::DeepSeek => &DEEPSEEK,
            ProviderKind::Zhipu => &ZHIPU,
            ProviderKind::Qwen => &QWEN,
            ProviderKind::Kimi => &KIMI,
        }
    }

    /// Lowercase name used on input and in config (e.g. `"qwen"`).
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// The adapter that speaks this provider's wire format.
    pub fn adapter(self) -> &'static dyn ProviderAdapter {
        static DEEPSEEK_ADAPTER: ChatCompletionsAdapter = ChatCompletionsAdapter::new(&DEEPSEEK);
        static ZHIPU_ADAPTER: ChatCompletionsAdapter = ChatCompletionsAdapter::new(&ZHIPU);
        static QWEN_ADAPTER: DashScopeAdapter = DashScopeAdapter::new(&QWEN);
        static KIMI_ADAPTER: ChatCompletionsAdapter = ChatCompletionsAdapter::new(&KIMI);

        match self {
            ProviderKind::DeepSeek => &DEEPSEEK_ADAPTER,
            ProviderKind::Zhipu => &ZHIPU_ADAPTER,
            ProviderKind::Qwen => &QWEN_ADAPTER,
            ProviderKind::Kimi => &KIMI_ADAPTER,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = DispatchError;

    /// Trims and lowercases before matching exactly against the known names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        PROVIDERS
            .iter()
            .find(|spec| spec.name == normalized)
            .map(|spec| spec.kind)
            .ok_or_else(|| DispatchError::UnsupportedProvider { name: s.to_string() })
    }
}

/// Resolve a caller-supplied provider name.
///
/// Only checks that the name is supported; credentials are looked up later.
pub fn resolve(provider_name: &str) -> Result<ProviderKind, DispatchError> {
    provider_name.parse()
}

// ─────────────────────────────────────────────
// ProviderSpec
// ─────────────────────────────────────────────

/// Request/response shape a provider's API uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireFormat {
    /// OpenAI-style `messages` body, text at `choices[0].message.content`.
    ChatCompletions,
    /// DashScope `input`/`parameters` body, text at `output.text`.
    DashScope,
}

/// Static specification describing one provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    /// Internal name (e.g. `"deepseek"`).
    pub name: &'static str,
    /// Human-readable name for logs and status output.
    pub display_name: &'static str,
    /// Environment variable holding the API key.
    pub env_key: &'static str,
    /// Fixed endpoint URL.
    pub endpoint: &'static str,
    /// Model id sent in every request.
    pub model: &'static str,
    pub wire_format: WireFormat,
}

static DEEPSEEK: ProviderSpec = ProviderSpec {
    kind: ProviderKind::DeepSeek,
    name: "deepseek",
    display_name: "DeepSeek",
    env_key: "DEEPSEEK_API_KEY",
    endpoint: "https://api.deepseek.com/v1/chat/completions",
    model: "deepseek-chat",
    wire_format: WireFormat::ChatCompletions,
};

static ZHIPU: ProviderSpec = ProviderSpec {
    kind: ProviderKind::Zhipu,
    name: "zhipu",
    display_name: "ZhiPu (GLM-4)",
    env_key: "ZHIPU_API_KEY",
    endpoint: "https://open.bigmodel.cn/api/paas/v4/chat/completions",
    model: "glm-4",
    wire_format: WireFormat::ChatCompletions,
};

static QWEN: ProviderSpec = ProviderSpec {
    kind: ProviderKind::Qwen,
    name: "qwen",
    display_name: "Qwen (DashScope)",
    env_key: "QWEN_API_KEY",
    endpoint: "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation",
    model: "qwen-turbo",
    wire_format: WireFormat::DashScope,
};

static KIMI: ProviderSpec = ProviderSpec {
    kind: ProviderKind::Kimi,
    name: "kimi",
    display_name: "Kimi (Moonshot)",
    env_key: "KIMI_API_KEY",
    endpoint: "https://api.moonshot.cn/v1/chat/completions",
    model: "moonshot-v1-8k",
    wire_format: WireFormat::ChatCompletions,
};

/// Complete list of supported provider specifications.
pub static PROVIDERS: [&ProviderSpec; 4] = [&DEEPSEEK, &ZHIPU, &QWEN, &KIMI];

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

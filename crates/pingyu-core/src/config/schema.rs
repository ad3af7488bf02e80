//! Configuration schema.
//!
//! Hierarchy: `Config` → `Defaults`, `ProvidersConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.pingyu/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub defaults: Defaults,
    pub providers: ProvidersConfig,
}

// ─────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────

/// Caller-side defaults.
///
/// The provider used when a request does not name one lives here rather than
/// in the dispatcher, which always requires an explicit provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Defaults {
    /// Provider name used when none is given (e.g. `"deepseek"`).
    pub provider: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            provider: "deepseek".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single provider (API key, optional endpoint override).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for bearer authentication. Empty means not configured.
    #[serde(default)]
    pub api_key: String,
    /// Full endpoint URL replacing the provider's fixed one (proxies, tests).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl ProviderConfig {
    /// Whether this provider has a non-blank API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// One `ProviderConfig` per supported provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub deepseek: ProviderConfig,
    #[serde(default)]
    pub zhipu: ProviderConfig,
    #[serde(default)]
    pub qwen: ProviderConfig,
    #[serde(default)]
    pub kimi: ProviderConfig,
}

impl ProvidersConfig {
    /// Get a provider config by lowercase name (e.g. `"qwen"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "deepseek" => Some(&self.deepseek),
            "zhipu" => Some(&self.zhipu),
            "qwen" => Some(&self.qwen),
            "kimi" => Some(&self.kimi),
            _ => None,
        }
    }

    /// Mutable variant of [`get_by_name`](Self::get_by_name).
    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut ProviderConfig> {
        match name {
            "deepseek" => Some(&mut self.deepseek),
            "zhipu" => Some(&mut self.zhipu),
            "qwen" => Some(&mut self.qwen),
            "kimi" => Some(&mut self.kimi),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

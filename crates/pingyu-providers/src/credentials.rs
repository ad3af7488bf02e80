//! API-key sources injected into the dispatcher.
//!
//! Keys are looked up on every call, never cached, so a long-running process
//! picks up rotated keys without a restart.

use std::collections::HashMap;

use pingyu_core::config::ProvidersConfig;

use crate::registry::ProviderKind;

/// Supplies the secret for a provider, if one is configured.
///
/// Returning `Some("")` is treated the same as `None` by the dispatcher.
pub trait CredentialSource: Send + Sync {
    fn api_key(&self, provider: ProviderKind) -> Option<String>;
}

/// Reads `<PROVIDER>_API_KEY` (e.g. `DEEPSEEK_API_KEY`) from the process
/// environment at call time.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn api_key(&self, provider: ProviderKind) -> Option<String> {
        std::env::var(provider.spec().env_key).ok()
    }
}

/// Keys from the `providers` section of the config file.
impl CredentialSource for ProvidersConfig {
    fn api_key(&self, provider: ProviderKind) -> Option<String> {
        self.get_by_name(provider.name())
            .filter(|c| c.is_configured())
            .map(|c| c.api_key.clone())
    }
}

/// Fixed in-memory keys, for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct StaticCredentials {
    keys: HashMap<ProviderKind, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, provider: ProviderKind, key: impl Into<String>) -> Self {
        self.keys.insert(provider, key.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn api_key(&self, provider: ProviderKind) -> Option<String> {
        self.keys.get(&provider).cloned()
    }
}

/// Tries each source in order and returns the first non-blank key.
///
/// Every layer carries a label so callers can report where a key came from.
#[derive(Default)]
pub struct LayeredCredentials {
    layers: Vec<(&'static str, Box<dyn CredentialSource>)>,
}

impl LayeredCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, label: &'static str, source: impl CredentialSource + 'static) -> Self {
        self.layers.push((label, Box::new(source)));
        self
    }

    /// The first non-blank key for `provider`, with the label of its layer.
    pub fn lookup(&self, provider: ProviderKind) -> Option<(&'static str, String)> {
        self.layers.iter().find_map(|(label, layer)| {
            layer
                .api_key(provider)
                .filter(|key| !key.trim().is_empty())
                .map(|key| (*label, key))
        })
    }
}

impl CredentialSource for LayeredCredentials {
    fn api_key(&self, provider: ProviderKind) -> Option<String> {
        self.lookup(provider).map(|(_, key)| key)
    }
}

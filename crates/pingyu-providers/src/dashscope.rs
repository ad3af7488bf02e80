//! DashScope text-generation adapter (Qwen).
//!
//! Same message list as chat completions, nested under `input`, with the
//! sampling knobs under `parameters`. The reply comes back at `output.text`.

use serde::Deserialize;
use serde_json::json;

use crate::chat_completions::user_messages;
use crate::error::ResponseParseError;
use crate::registry::ProviderSpec;
use crate::traits::{finish_text, ProviderAdapter, ProviderRequest, MAX_TOKENS, TEMPERATURE};

const TEXT_PATH: &str = "output.text";

#[derive(Debug, Deserialize)]
struct DashScopeResponse {
    output: Option<GenerationOutput>,
}

#[derive(Debug, Deserialize)]
struct GenerationOutput {
    text: Option<String>,
}

/// Adapter for Alibaba DashScope's native generation API.
#[derive(Debug)]
pub struct DashScopeAdapter {
    spec: &'static ProviderSpec,
}

impl DashScopeAdapter {
    pub const fn new(spec: &'static ProviderSpec) -> Self {
        Self { spec }
    }
}

impl ProviderAdapter for DashScopeAdapter {
    fn spec(&self) -> &'static ProviderSpec {
        self.spec
    }

    fn build_request(&self, credential: &str, prompt: &str) -> ProviderRequest {
        let body = json!({
            "model": self.spec.model,
            "input": { "messages": user_messages(prompt) },
            "parameters": {
                "temperature": TEMPERATURE,
                "max_tokens": MAX_TOKENS,
            },
        });
        ProviderRequest::json(self.spec.endpoint, credential, body)
    }

    fn parse_response(&self, raw_body: &str) -> Result<String, ResponseParseError> {
        let response: DashScopeResponse = serde_json::from_str(raw_body)?;
        finish_text(response.output.and_then(|o| o.text), TEXT_PATH)
    }
}

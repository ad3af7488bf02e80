//! OpenAI-compatible `/chat/completions` adapter.
//!
//! Covers: DeepSeek, ZhiPu (GLM-4), Kimi (Moonshot). They differ only in
//! endpoint and model id, both taken from the provider spec.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ResponseParseError;
use crate::registry::ProviderSpec;
use crate::traits::{finish_text, ProviderAdapter, ProviderRequest, MAX_TOKENS, TEMPERATURE};

const TEXT_PATH: &str = "choices[0].message.content";

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

/// The single user turn carrying the prompt.
pub(crate) fn user_messages(prompt: &str) -> Value {
    json!([{ "role": "user", "content": prompt }])
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// ─────────────────────────────────────────────
// Adapter
// ─────────────────────────────────────────────

/// Adapter for providers speaking the OpenAI chat-completions format.
#[derive(Debug)]
pub struct ChatCompletionsAdapter {
    spec: &'static ProviderSpec,
}

impl ChatCompletionsAdapter {
    pub const fn new(spec: &'static ProviderSpec) -> Self {
        Self { spec }
    }
}

impl ProviderAdapter for ChatCompletionsAdapter {
    fn spec(&self) -> &'static ProviderSpec {
        self.spec
    }

    fn build_request(&self, credential: &str, prompt: &str) -> ProviderRequest {
        let body = json!({
            "model": self.spec.model,
            "messages": user_messages(prompt),
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });
        ProviderRequest::json(self.spec.endpoint, credential, body)
    }

    fn parse_response(&self, raw_body: &str) -> Result<String, ResponseParseError> {
        let response: ChatCompletionResponse = serde_json::from_str(raw_body)?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content);
        finish_text(content, TEXT_PATH)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProviderKind;
    use reqwest::header::AUTHORIZATION;

    #[test]
    fn test_build_request_deepseek() {
        let adapter = ProviderKind::DeepSeek.adapter();
        let req = adapter.build_request("sk-ds", "写评语");

        assert_eq!(req.url, "https://api.deepseek.com/v1/chat/completions");
        assert_eq!(req.header(&AUTHORIZATION), Some("Bearer sk-ds"));
        assert_eq!(
            req.body,
            serde_json::json!({
                "model": "deepseek-chat",
                "messages": [{ "role": "user", "content": "写评语" }],
                "temperature": 0.7,
                "max_tokens": 500
            })
        );
    }

    #[test]
    fn test_build_request_models() {
        let zhipu = ProviderKind::Zhipu.adapter().build_request("k", "p");
        assert_eq!(zhipu.body["model"], "glm-4");
        assert_eq!(zhipu.url, "https://open.bigmodel.cn/api/paas/v4/chat/completions");

        let kimi = ProviderKind::Kimi.adapter().build_request("k", "p");
        assert_eq!(kimi.body["model"], "moonshot-v1-8k");
        assert_eq!(kimi.url, "https://api.moonshot.cn/v1/chat/completions");
    }

    #[test]
    fn test_parse_trims_content() {
        let adapter = ProviderKind::DeepSeek.adapter();
        let text = adapter
            .parse_response(r#"{"choices":[{"message":{"content":"  该生表现优异。  "}}]}"#)
            .unwrap();
        assert_eq!(text, "该生表现优异。");
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let adapter = ProviderKind::Kimi.adapter();
        let body = serde_json::json!({
            "id": "cmpl-1",
            "object": "chat.completion",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "第一条" }, "finish_reason": "stop" },
                { "index": 1, "message": { "role": "assistant", "content": "第二条" } }
            ],
            "usage": { "total_tokens": 42 }
        });
        assert_eq!(adapter.parse_response(&body.to_string()).unwrap(), "第一条");
    }

    #[test]
    fn test_parse_missing_paths() {
        let adapter = ProviderKind::Zhipu.adapter();
        for body in [
            r#"{}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[{"message":{}}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
        ] {
            assert!(
                matches!(
                    adapter.parse_response(body),
                    Err(ResponseParseError::MissingField(TEXT_PATH))
                ),
                "{body}"
            );
        }
    }

    #[test]
    fn test_parse_invalid_or_blank() {
        let adapter = ProviderKind::DeepSeek.adapter();
        assert!(matches!(
            adapter.parse_response("<html>bad gateway</html>"),
            Err(ResponseParseError::InvalidJson(_))
        ));
        assert!(matches!(
            adapter.parse_response(r#"{"choices":[{"message":{"content":"   "}}]}"#),
            Err(ResponseParseError::EmptyText(_))
        ));
        // DashScope-shaped body is not accepted here
        assert!(adapter
            .parse_response(r#"{"output":{"text":"hi"}}"#)
            .is_err());
    }
}

//! The dispatcher — one comment per call, one HTTP request per comment.
//!
//! Flow: validate input → resolve provider → look up credential → build the
//! prompt → adapter builds the request → POST → adapter parses the body.
//! Unsupported names and missing keys fail before any network I/O. Nothing is
//! retried and no state survives between calls.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use pingyu_core::config::ProvidersConfig;
use pingyu_core::utils::truncate_string;

use crate::credentials::CredentialSource;
use crate::error::{CallFailure, DispatchError, ResponseParseError};
use crate::prompt::build_prompt;
use crate::registry::{resolve, ProviderKind};
use crate::traits::{CommentGenerator, ProviderRequest};

/// Per-call timeout covering connect, send, and reading the body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest raw body (in characters) kept in errors and logs.
const MAX_BODY_CHARS: usize = 500;

// ─────────────────────────────────────────────
// GenerationRequest
// ─────────────────────────────────────────────

/// A validated request for one comment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    provider: ProviderKind,
    student_name: String,
    student_info: String,
}

impl GenerationRequest {
    /// Validate both student fields (non-blank), then resolve the provider.
    pub fn new(
        provider_name: &str,
        student_name: &str,
        student_info: &str,
    ) -> Result<Self, DispatchError> {
        if student_name.trim().is_empty() {
            return Err(DispatchError::InvalidInput {
                field: "student_name",
            });
        }
        if student_info.trim().is_empty() {
            return Err(DispatchError::InvalidInput {
                field: "student_info",
            });
        }
        Ok(Self {
            provider: resolve(provider_name)?,
            student_name: student_name.to_string(),
            student_info: student_info.to_string(),
        })
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    pub fn student_info(&self) -> &str {
        &self.student_info
    }
}

// ─────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────

/// Resolves a provider, calls it, and returns the normalized comment.
///
/// Cheap to share: wrap in an `Arc` and call from any number of tasks.
pub struct Dispatcher {
    client: reqwest::Client,
    credentials: Arc<dyn CredentialSource>,
    /// Endpoint replacements keyed by provider (proxies, tests).
    endpoints: HashMap<ProviderKind, String>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher reading keys from `credentials` on every call.
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            credentials,
            endpoints: HashMap::new(),
        })
    }

    /// Send `provider`'s requests to `url` instead of its fixed endpoint.
    pub fn with_endpoint(mut self, provider: ProviderKind, url: impl Into<String>) -> Self {
        self.endpoints.insert(provider, url.into());
        self
    }

    /// Apply every `apiBase` set in the config's `providers` section.
    pub fn with_endpoint_overrides(mut self, providers: &ProvidersConfig) -> Self {
        for kind in ProviderKind::ALL {
            if let Some(base) = providers
                .get_by_name(kind.name())
                .and_then(|c| c.api_base.as_deref())
                .filter(|b| !b.trim().is_empty())
            {
                debug!(provider = %kind, endpoint = base, "Using endpoint override");
                self.endpoints.insert(kind, base.to_string());
            }
        }
        self
    }

    /// The URL requests for `provider` will be sent to.
    pub fn endpoint(&self, provider: ProviderKind) -> &str {
        self.endpoints
            .get(&provider)
            .map(String::as_str)
            .unwrap_or(provider.spec().endpoint)
    }

    /// Whether a non-blank key is currently available for `provider`.
    pub fn is_configured(&self, provider: ProviderKind) -> bool {
        self.credential(provider).is_ok()
    }

    /// Generate a comment from raw caller input.
    pub async fn generate_comment(
        &self,
        provider_name: &str,
        student_name: &str,
        student_info: &str,
    ) -> Result<String, DispatchError> {
        let request = GenerationRequest::new(provider_name, student_name, student_info)?;
        self.generate(&request).await
    }

    /// Generate a comment for an already validated request.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, DispatchError> {
        let provider = request.provider();
        let credential = self.credential(provider)?;

        let prompt = build_prompt(request.student_name(), request.student_info());
        let adapter = provider.adapter();
        let mut http_request = adapter.build_request(&credential, &prompt);
        http_request.url = self.endpoint(provider).to_string();

        debug!(
            provider = %provider,
            model = adapter.spec().model,
            url = %http_request.url,
            prompt_chars = prompt.chars().count(),
            "Calling provider"
        );

        let (status, body) = self.post(provider, http_request).await?;

        let parsed = std::str::from_utf8(&body)
            .map_err(ResponseParseError::from)
            .and_then(|text| adapter.parse_response(text));

        match parsed {
            Ok(comment) => {
                debug!(
                    provider = %provider,
                    comment_chars = comment.chars().count(),
                    "Comment generated"
                );
                Ok(comment)
            }
            Err(reason) => {
                let body = truncate_string(&String::from_utf8_lossy(&body), MAX_BODY_CHARS);
                error!(
                    provider = %provider,
                    status,
                    body = %body,
                    error = %reason,
                    "Unexpected provider response"
                );
                Err(DispatchError::ProviderResponse {
                    provider,
                    status,
                    body,
                    reason,
                })
            }
        }
    }

    fn credential(&self, provider: ProviderKind) -> Result<String, DispatchError> {
        self.credentials
            .api_key(provider)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(DispatchError::MissingCredential {
                provider,
                env_key: provider.spec().env_key,
            })
    }

    /// POST once and return `(status, raw body)` for a 2xx reply.
    async fn post(
        &self,
        provider: ProviderKind,
        request: ProviderRequest,
    ) -> Result<(u16, Vec<u8>), DispatchError> {
        let call_error = |cause: CallFailure| {
            error!(provider = %provider, error = %cause, "Provider call failed");
            DispatchError::ProviderCall { provider, cause }
        };

        // Adapter headers first: `.json()` only sets Content-Type when absent.
        let mut builder = self.client.post(&request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .json(&request.body)
            .send()
            .await
            .map_err(|e| call_error(CallFailure::Transport(e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| call_error(CallFailure::Transport(e)))?
            .to_vec();

        if !status.is_success() {
            return Err(call_error(CallFailure::Status {
                status: status.as_u16(),
                body: truncate_string(&String::from_utf8_lossy(&body), MAX_BODY_CHARS),
            }));
        }

        Ok((status.as_u16(), body))
    }
}

#[async_trait]
impl CommentGenerator for Dispatcher {
    async fn generate_comment(
        &self,
        provider_name: &str,
        student_name: &str,
        student_info: &str,
    ) -> Result<String, DispatchError> {
        Dispatcher::generate_comment(self, provider_name, student_name, student_info).await
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentials;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CHAT_PATH: &str = "/v1/chat/completions";
    const QWEN_PATH: &str = "/api/v1/services/aigc/text-generation/generation";

    fn all_keys() -> StaticCredentials {
        StaticCredentials::new()
            .with_key(ProviderKind::DeepSeek, "ds-key")
            .with_key(ProviderKind::Zhipu, "zp-key")
            .with_key(ProviderKind::Qwen, "qw-key")
            .with_key(ProviderKind::Kimi, "km-key")
    }

    /// Dispatcher whose every endpoint points at `server`.
    fn dispatcher_for(server: &MockServer, credentials: StaticCredentials) -> Dispatcher {
        let mut dispatcher = Dispatcher::new(Arc::new(credentials)).unwrap();
        for kind in ProviderKind::ALL {
            let path = match kind {
                ProviderKind::Qwen => QWEN_PATH,
                _ => CHAT_PATH,
            };
            dispatcher = dispatcher.with_endpoint(kind, format!("{}{}", server.uri(), path));
        }
        dispatcher
    }

    fn chat_reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
    }

    // ── Input validation ──

    #[test]
    fn test_request_rejects_blank_fields() {
        let err = GenerationRequest::new("deepseek", "  ", "info").unwrap_err();
        assert!(matches!(err, DispatchError::InvalidInput { field: "student_name" }));

        let err = GenerationRequest::new("deepseek", "张三", "").unwrap_err();
        assert!(matches!(err, DispatchError::InvalidInput { field: "student_info" }));
    }

    #[test]
    fn test_request_resolves_provider() {
        let req = GenerationRequest::new(" Qwen ", "张三", "成绩优秀").unwrap();
        assert_eq!(req.provider(), ProviderKind::Qwen);
        assert_eq!(req.student_name(), "张三");
    }

    #[test]
    fn test_endpoint_defaults_and_overrides() {
        let mut providers = ProvidersConfig::default();
        providers.kimi.api_base = Some("http://proxy.local/kimi".to_string());
        providers.qwen.api_base = Some("   ".to_string());

        let dispatcher = Dispatcher::new(Arc::new(StaticCredentials::new()))
            .unwrap()
            .with_endpoint_overrides(&providers);

        assert_eq!(dispatcher.endpoint(ProviderKind::Kimi), "http://proxy.local/kimi");
        assert_eq!(
            dispatcher.endpoint(ProviderKind::Qwen),
            ProviderKind::Qwen.spec().endpoint
        );
        assert_eq!(
            dispatcher.endpoint(ProviderKind::DeepSeek),
            "https://api.deepseek.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_is_configured() {
        let credentials = StaticCredentials::new()
            .with_key(ProviderKind::Zhipu, "zk")
            .with_key(ProviderKind::Kimi, "  ");
        let dispatcher = Dispatcher::new(Arc::new(credentials)).unwrap();
        assert!(dispatcher.is_configured(ProviderKind::Zhipu));
        assert!(!dispatcher.is_configured(ProviderKind::Kimi));
        assert!(!dispatcher.is_configured(ProviderKind::DeepSeek));
    }

    // ── Success paths ──

    #[tokio::test]
    async fn test_deepseek_example_trims_comment() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .and(header("Authorization", "Bearer ds-key"))
            .and(header("Content-Type", "application/json"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-chat",
                "temperature": 0.7,
                "max_tokens": 500
            })))
            .respond_with(chat_reply("  该生表现优异。  "))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server, all_keys());
        let comment = dispatcher
            .generate_comment("deepseek", "张三", "性格开朗，成绩优秀")
            .await
            .unwrap();

        assert_eq!(comment, "该生表现优异。");
    }

    #[tokio::test]
    async fn test_every_provider_any_casing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(chat_reply("\n评语内容\n"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(QWEN_PATH))
            .and(header("Authorization", "Bearer qw-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "qwen-turbo",
                "parameters": { "temperature": 0.7, "max_tokens": 500 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": { "text": " 千问评语 " }
            })))
            .expect(2)
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server, all_keys());

        for name in ["DeepSeek", " zhipu", "KIMI ", "kimi"] {
            let comment = dispatcher
                .generate_comment(name, "王五", "热爱阅读")
                .await
                .unwrap();
            assert_eq!(comment, "评语内容", "{name}");
        }
        for name in ["qwen", "  QWen\t"] {
            let comment = dispatcher
                .generate_comment(name, "王五", "热爱阅读")
                .await
                .unwrap();
            assert_eq!(comment, "千问评语", "{name}");
        }
    }

    #[tokio::test]
    async fn test_prompt_is_sent_verbatim() {
        let server = MockServer::start().await;
        let prompt = build_prompt("李明", "乐于助人");

        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .and(body_partial_json(serde_json::json!({
                "model": "glm-4",
                "messages": [{ "role": "user", "content": prompt }]
            })))
            .respond_with(chat_reply("好"))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server, all_keys());
        let comment = dispatcher
            .generate_comment("zhipu", "李明", "乐于助人")
            .await
            .unwrap();
        assert_eq!(comment, "好");
    }

    // ── Failures before the network ──

    #[tokio::test]
    async fn test_unsupported_provider_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(chat_reply("never"))
            .expect(0)
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server, all_keys());
        for name in ["openai", "gpt-4", "", "deepseek-chat"] {
            let err = dispatcher
                .generate_comment(name, "张三", "成绩优秀")
                .await
                .unwrap_err();
            assert!(
                matches!(err, DispatchError::UnsupportedProvider { .. }),
                "{name:?}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(chat_reply("never"))
            .expect(0)
            .mount(&server)
            .await;

        let credentials = StaticCredentials::new().with_key(ProviderKind::Zhipu, "   ");
        let dispatcher = dispatcher_for(&server, credentials);

        let err = dispatcher
            .generate_comment("zhipu", "张三", "成绩优秀")
            .await
            .unwrap_err();
        match err {
            DispatchError::MissingCredential { provider, env_key } => {
                assert_eq!(provider, ProviderKind::Zhipu);
                assert_eq!(env_key, "ZHIPU_API_KEY");
            }
            other => panic!("expected MissingCredential, got {other:?}"),
        }

        let err = dispatcher
            .generate_comment("qwen", "张三", "成绩优秀")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::MissingCredential {
                provider: ProviderKind::Qwen,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unsupported_checked_before_credentials() {
        let dispatcher = Dispatcher::new(Arc::new(StaticCredentials::new())).unwrap();
        let err = dispatcher
            .generate_comment("chatgpt", "张三", "成绩优秀")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnsupportedProvider { .. }));
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let dispatcher = Dispatcher::new(Arc::new(all_keys())).unwrap();
        let err = dispatcher
            .generate_comment("deepseek", "张三", " ")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidInput { .. }));
    }

    // ── Upstream failures ──

    #[tokio::test]
    async fn test_http_500_is_call_error_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server, all_keys());
        let err = dispatcher
            .generate_comment("kimi", "张三", "成绩优秀")
            .await
            .unwrap_err();

        match err {
            DispatchError::ProviderCall {
                provider,
                cause: CallFailure::Status { status, ref body },
            } => {
                assert_eq!(provider, ProviderKind::Kimi);
                assert_eq!(status, 500);
                assert_eq!(body, "internal error");
            }
            ref other => panic!("expected ProviderCall, got {other:?}"),
        }
        assert_eq!(err.suggested_status(), 502);
        // MockServer verifies `.expect(1)` on drop
    }

    #[tokio::test]
    async fn test_http_401_is_call_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(QWEN_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "code": "InvalidApiKey",
                "message": "Invalid API-key provided."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server, all_keys());
        let err = dispatcher
            .generate_comment("qwen", "张三", "成绩优秀")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::ProviderCall {
                provider: ProviderKind::Qwen,
                cause: CallFailure::Status { status: 401, .. },
            }
        ));
    }

    #[tokio::test]
    async fn test_network_error_is_call_error() {
        // Nothing listens on port 1
        let dispatcher = Dispatcher::new(Arc::new(all_keys()))
            .unwrap()
            .with_endpoint(ProviderKind::DeepSeek, "http://127.0.0.1:1/v1/chat/completions");

        let err = dispatcher
            .generate_comment("deepseek", "张三", "成绩优秀")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::ProviderCall {
                cause: CallFailure::Transport(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_text_field_is_response_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server, all_keys());
        let err = dispatcher
            .generate_comment("deepseek", "张三", "成绩优秀")
            .await
            .unwrap_err();

        match err {
            DispatchError::ProviderResponse {
                provider,
                status,
                body,
                ..
            } => {
                assert_eq!(provider, ProviderKind::DeepSeek);
                assert_eq!(status, 200);
                assert_eq!(body, r#"{"choices":[]}"#);
            }
            other => panic!("expected ProviderResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_and_blank_text_are_response_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(QWEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(chat_reply("    "))
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server, all_keys());

        let err = dispatcher
            .generate_comment("qwen", "张三", "成绩优秀")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::ProviderResponse { .. }));

        let err = dispatcher
            .generate_comment("kimi", "张三", "成绩优秀")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::ProviderResponse { .. }));
    }

    #[tokio::test]
    async fn test_long_error_body_is_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(5000)))
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server, all_keys());
        let err = dispatcher
            .generate_comment("deepseek", "张三", "成绩优秀")
            .await
            .unwrap_err();
        match err {
            DispatchError::ProviderResponse { body, .. } => {
                assert_eq!(body.chars().count(), MAX_BODY_CHARS);
                assert!(body.ends_with("..."));
            }
            other => panic!("expected ProviderResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_utf8_body_is_response_error() {
        let server = MockServer::start().await;
        let mut raw = br#"{"choices":[{"message":{"content":"ok "#.to_vec();
        raw.extend_from_slice(&[0xff, 0xfe]);
        raw.extend_from_slice(br#" end"}}]}"#);

        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_raw(raw, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher_for(&server, all_keys());
        let err = dispatcher
            .generate_comment("deepseek", "张三", "成绩优秀")
            .await
            .unwrap_err();

        match err {
            DispatchError::ProviderResponse {
                provider,
                status,
                body,
                reason: ResponseParseError::InvalidUtf8(_),
            } => {
                assert_eq!(provider, ProviderKind::DeepSeek);
                assert_eq!(status, 200);
                assert!(body.contains('\u{FFFD}'));
                assert!(body.ends_with(" end\"}}]}"));
            }
            other => panic!("expected InvalidUtf8 ProviderResponse, got {other:?}"),
        }
    }

    // ── Concurrency ──

    #[tokio::test]
    async fn test_concurrent_calls_share_dispatcher() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(chat_reply("并发评语"))
            .expect(8)
            .mount(&server)
            .await;

        let dispatcher = Arc::new(dispatcher_for(&server, all_keys()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher
                        .generate_comment("deepseek", &format!("学生{i}"), "认真")
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "并发评语");
        }
    }

    #[tokio::test]
    async fn test_usable_as_comment_generator() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_PATH))
            .respond_with(chat_reply("trait 调用"))
            .mount(&server)
            .await;

        let generator: Arc<dyn CommentGenerator> = Arc::new(dispatcher_for(&server, all_keys()));
        let comment = generator
            .generate_comment("kimi", "张三", "成绩优秀")
            .await
            .unwrap();
        assert_eq!(comment, "trait 调用");
    }
}

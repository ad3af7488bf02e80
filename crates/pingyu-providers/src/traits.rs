//! Adapter and generator traits — the seams of the dispatch layer.
//!
//! A `ProviderAdapter` knows one wire format: how to turn a prompt into an
//! HTTP request and how to pull the comment back out of the response body.
//! It never performs I/O; the dispatcher owns the transport.

use async_trait::async_trait;
use reqwest::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{DispatchError, ResponseParseError};
use crate::registry::ProviderSpec;

/// Sampling temperature sent with every request.
pub const TEMPERATURE: f64 = 0.7;

/// Generation length cap sent with every request.
pub const MAX_TOKENS: u32 = 500;

/// A fully built provider request, ready to POST.
#[derive(Clone, Debug)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: Vec<(HeaderName, String)>,
    pub body: serde_json::Value,
}

impl ProviderRequest {
    /// Request with the JSON content type and bearer auth headers set.
    pub fn json(url: &str, credential: &str, body: serde_json::Value) -> Self {
        Self {
            url: url.to_string(),
            headers: vec![
                (CONTENT_TYPE, "application/json".to_string()),
                (AUTHORIZATION, format!("Bearer {credential}")),
            ],
            body,
        }
    }

    /// Value of the first header with this name, if any.
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Request building and response parsing for one provider.
///
/// Implementations must be stateless so they can live in statics and be
/// shared across concurrent calls.
pub trait ProviderAdapter: Send + Sync {
    /// Static metadata of the provider this adapter serves.
    fn spec(&self) -> &'static ProviderSpec;

    /// Build the POST request for `prompt`, authorized with `credential`.
    fn build_request(&self, credential: &str, prompt: &str) -> ProviderRequest;

    /// Extract the trimmed comment text from a 2xx response body.
    fn parse_response(&self, raw_body: &str) -> Result<String, ResponseParseError>;
}

/// Something that can turn student details into a comment.
///
/// Implemented by [`Dispatcher`](crate::Dispatcher); callers hold it as
/// `Arc<dyn CommentGenerator>` so they can be tested without HTTP.
#[async_trait]
pub trait CommentGenerator: Send + Sync {
    async fn generate_comment(
        &self,
        provider_name: &str,
        student_name: &str,
        student_info: &str,
    ) -> Result<String, DispatchError>;
}

/// Trim extracted text and reject a missing or blank value.
pub(crate) fn finish_text(
    text: Option<String>,
    path: &'static str,
) -> Result<String, ResponseParseError> {
    let text = text.ok_or(ResponseParseError::MissingField(path))?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ResponseParseError::EmptyText(path));
    }
    Ok(trimmed.to_string())
}

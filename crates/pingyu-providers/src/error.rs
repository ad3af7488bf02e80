//! Failure taxonomy for one comment-generation call.
//!
//! Every variant is terminal: nothing here is retried, and no failure is ever
//! turned into a default or empty comment. Callers decide the user-facing
//! message; [`DispatchError::kind`] and [`DispatchError::suggested_status`]
//! give them a stable classification to map from.

use thiserror::Error;

use crate::registry::ProviderKind;

/// Why a provider call failed before a usable response body arrived.
#[derive(Debug, Error)]
pub enum CallFailure {
    /// DNS, connect, TLS, timeout, or body-read failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The provider answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl CallFailure {
    /// Whether the failure was the 30 s request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CallFailure::Transport(e) if e.is_timeout())
    }
}

/// Why a 2xx body could not be turned into a comment.
#[derive(Debug, Error)]
pub enum ResponseParseError {
    #[error("body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("body is not valid JSON for this provider: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` is empty")]
    EmptyText(&'static str),
}

/// Errors returned by the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The provider name is not one of the supported set.
    #[error("unsupported AI provider: {name:?} (expected one of deepseek, zhipu, qwen, kimi)")]
    UnsupportedProvider { name: String },

    /// The provider is known but has no API key configured.
    #[error("{provider} is not configured: set {env_key}")]
    MissingCredential {
        provider: ProviderKind,
        env_key: &'static str,
    },

    /// Transport failure or non-2xx status from the provider.
    #[error("{provider} API call failed: {cause}")]
    ProviderCall {
        provider: ProviderKind,
        #[source]
        cause: CallFailure,
    },

    /// 2xx status, but the body did not have the expected shape.
    #[error("{provider} returned an unexpected response (HTTP {status}): {reason}")]
    ProviderResponse {
        provider: ProviderKind,
        status: u16,
        /// Truncated raw body, for diagnosis.
        body: String,
        #[source]
        reason: ResponseParseError,
    },

    /// A required student field was empty.
    #[error("{field} must not be empty")]
    InvalidInput { field: &'static str },
}

/// Stable, payload-free classification of a [`DispatchError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedProvider,
    MissingCredential,
    ProviderCall,
    ProviderResponse,
    InvalidInput,
}

impl ErrorKind {
    /// Snake-case tag suitable for logs and JSON error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnsupportedProvider => "unsupported_provider",
            ErrorKind::MissingCredential => "missing_credential",
            ErrorKind::ProviderCall => "provider_call_error",
            ErrorKind::ProviderResponse => "provider_response_error",
            ErrorKind::InvalidInput => "invalid_input",
        }
    }
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::UnsupportedProvider { .. } => ErrorKind::UnsupportedProvider,
            DispatchError::MissingCredential { .. } => ErrorKind::MissingCredential,
            DispatchError::ProviderCall { .. } => ErrorKind::ProviderCall,
            DispatchError::ProviderResponse { .. } => ErrorKind::ProviderResponse,
            DispatchError::InvalidInput { .. } => ErrorKind::InvalidInput,
        }
    }

    /// The provider involved, if the name was resolved.
    pub fn provider(&self) -> Option<ProviderKind> {
        match self {
            DispatchError::MissingCredential { provider, .. }
            | DispatchError::ProviderCall { provider, .. }
            | DispatchError::ProviderResponse { provider, .. } => Some(*provider),
            DispatchError::UnsupportedProvider { .. } | DispatchError::InvalidInput { .. } => None,
        }
    }

    /// HTTP status an API layer should answer with.
    ///
    /// Caller-fixable problems map to 400, upstream failures to 502.
    pub fn suggested_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::UnsupportedProvider
            | ErrorKind::MissingCredential
            | ErrorKind::InvalidInput => 400,
            ErrorKind::ProviderCall | ErrorKind::ProviderResponse => 502,
        }
    }

    /// Whether the caller (rather than the upstream provider) can fix this.
    pub fn is_client_error(&self) -> bool {
        self.suggested_status() < 500
    }
}

//! Comment-generation dispatch layer for Pingyu.
//!
//! Turns `(provider, student_name, student_info)` into one teacher's comment
//! by calling a third-party chat-completion API.
//!
//! # Architecture
//!
//! - [`registry`] — the closed set of providers ([`ProviderKind`]) and their static specs
//! - [`prompt`] — the shared prompt template
//! - [`traits::ProviderAdapter`] — request building + response parsing for one wire format
//! - [`chat_completions`] / [`dashscope`] — the two adapter implementations
//! - [`credentials`] — injected API-key sources (env, config file, static map)
//! - [`dispatcher::Dispatcher`] — resolves, calls, and classifies failures
//! - [`error::DispatchError`] — the failure taxonomy callers map to responses

pub mod chat_completions;
pub mod credentials;
pub mod dashscope;
pub mod dispatcher;
pub mod error;
pub mod prompt;
pub mod registry;
pub mod traits;

// Re-export main types for convenience
pub use credentials::{CredentialSource, EnvCredentials, LayeredCredentials, StaticCredentials};
pub use dispatcher::{Dispatcher, GenerationRequest, REQUEST_TIMEOUT};
pub use error::{CallFailure, DispatchError, ErrorKind, ResponseParseError};
pub use prompt::build_prompt;
pub use registry::{resolve, ProviderKind, ProviderSpec, WireFormat, PROVIDERS};
pub use traits::{CommentGenerator, ProviderAdapter, ProviderRequest};

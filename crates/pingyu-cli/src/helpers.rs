//! Shared CLI helpers — key layering, path expansion, comment printing,
//! error hints.

use std::path::PathBuf;

use colored::Colorize;

use pingyu_core::config::ProvidersConfig;
use pingyu_providers::{CredentialSource, DispatchError, LayeredCredentials, REQUEST_TIMEOUT};

/// Label of the process-environment key layer.
pub const ENV_LAYER: &str = "env";
/// Label of the config-file key layer.
pub const CONFIG_LAYER: &str = "config";

/// Key sources used by every command: `env` first, the config file second.
pub fn credential_layers(
    env: impl CredentialSource + 'static,
    providers: &ProvidersConfig,
) -> LayeredCredentials {
    LayeredCredentials::new()
        .push(ENV_LAYER, env)
        .push(CONFIG_LAYER, providers.clone())
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print a generated comment to stdout.
pub fn print_comment(provider: &str, student_name: &str, comment: &str) {
    println!();
    println!(
        "{} {}",
        format!("📝 {student_name}").cyan().bold(),
        format!("({provider})").dimmed()
    );
    println!("{comment}");
    println!();
}

/// One-line hint telling the user what to do about a failure.
pub fn error_hint(err: &DispatchError) -> String {
    match err {
        DispatchError::UnsupportedProvider { .. } => {
            "choose one of: deepseek, zhipu, qwen, kimi".to_string()
        }
        DispatchError::MissingCredential { env_key, provider } => format!(
            "export {env_key}=... or set providers.{provider}.apiKey in the config file"
        ),
        DispatchError::ProviderCall { cause, .. } if cause.is_timeout() => format!(
            "no answer within {}s; try again or pick another provider",
            REQUEST_TIMEOUT.as_secs()
        ),
        DispatchError::ProviderCall { .. } => {
            "the provider could not be reached or rejected the request; check the key and network"
                .to_string()
        }
        DispatchError::ProviderResponse { .. } => {
            "the provider answered in an unexpected format; rerun with --logs for the raw body"
                .to_string()
        }
        DispatchError::InvalidInput { field } => format!("{field} must not be empty"),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

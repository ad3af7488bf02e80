//! `pingyu status` — show configuration and provider status.
//!
//! - Config path and default provider
//! - Per provider: where its key comes from (env or config) and its endpoint

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use pingyu_core::config::{get_config_path, load_config};
use pingyu_core::utils::mask_secret;
use pingyu_providers::{EnvCredentials, LayeredCredentials, ProviderKind};

use crate::helpers::{credential_layers, ENV_LAYER};

/// Where a provider's key would be taken from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeySource {
    Env(String),
    Config(String),
    Missing,
}

/// Where the dispatcher would take `provider`'s key from.
pub fn key_source(provider: ProviderKind, credentials: &LayeredCredentials) -> KeySource {
    match credentials.lookup(provider) {
        Some((ENV_LAYER, key)) => KeySource::Env(key),
        Some((_, key)) => KeySource::Config(key),
        None => KeySource::Missing,
    }
}

/// Run the status command.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    println!();
    println!("{}", "📝 Pingyu Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        path.display(),
        if path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );
    println!("  {:<18} {}", "Default provider:".bold(), config.defaults.provider);

    println!();
    println!("  {}", "Providers:".bold());
    let credentials = credential_layers(EnvCredentials, &config.providers);
    for provider in ProviderKind::ALL {
        let spec = provider.spec();
        let status = match key_source(provider, &credentials) {
            KeySource::Env(key) => {
                format!("{} {} (env {})", "✓".green(), mask_secret(&key), spec.env_key)
            }
            KeySource::Config(key) => {
                format!("{} {} (config)", "✓".green(), mask_secret(&key))
            }
            KeySource::Missing => format!(
                "{}",
                format!("· not configured (set {})", spec.env_key).dimmed()
            ),
        };
        println!("    {:<20} {}", spec.display_name, status);

        if let Some(base) = config
            .providers
            .get_by_name(spec.name)
            .and_then(|c| c.api_base.as_deref())
        {
            println!("    {:<20} {}", "", format!("endpoint → {base}").dimmed());
        }
    }
    println!();

    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

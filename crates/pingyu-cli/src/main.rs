//! Pingyu CLI — entry point.
//!
//! # Commands
//!
//! - `pingyu generate -n NAME -i INFO [-p PROVIDER]` — write one student comment
//! - `pingyu probe` — try every provider with a sample student
//! - `pingyu status` — show config path and provider key status
//! - `pingyu onboard` — create a default config file

mod generate;
mod helpers;
mod onboard;
mod probe;
mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use pingyu_core::config::{load_config, Config};
use pingyu_providers::{CredentialSource, Dispatcher, EnvCredentials};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Pingyu — AI-written student comments for head teachers
#[derive(Parser)]
#[command(name = "pingyu", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.pingyu/config.json)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a comment for one student
    Generate {
        /// Student name
        #[arg(short = 'n', long)]
        name: String,

        /// What the teacher knows about the student
        #[arg(short, long)]
        info: String,

        /// deepseek | zhipu | qwen | kimi (defaults to config `defaults.provider`)
        #[arg(short, long)]
        provider: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Try every provider with a sample student
    Probe {
        #[arg(long, default_value = probe::SAMPLE_NAME)]
        name: String,

        #[arg(long, default_value = probe::SAMPLE_INFO)]
        info: String,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and provider key status
    Status,

    /// Create a default config file
    Onboard,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; variables already set are not overwritten.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref().map(helpers::expand_tilde);

    match cli.command {
        Commands::Generate {
            name,
            info,
            provider,
            logs,
        } => {
            init_logging(logs);
            let config = load_config(config_path.as_deref());
            let provider = generate::pick_provider(provider.as_deref(), &config);
            let dispatcher = build_dispatcher(&config, EnvCredentials)?;
            generate::run(&*dispatcher, &provider, &name, &info).await
        }
        Commands::Probe { name, info, logs } => {
            init_logging(logs);
            let config = load_config(config_path.as_deref());
            let dispatcher = build_dispatcher(&config, EnvCredentials)?;
            probe::run(&*dispatcher, &name, &info).await
        }
        Commands::Status => status::run(config_path.as_deref()),
        Commands::Onboard => onboard::run(config_path),
    }
}

/// Build the dispatcher: `env` keys first, config-file keys as fallback.
pub fn build_dispatcher(
    config: &Config,
    env: impl CredentialSource + 'static,
) -> Result<Arc<Dispatcher>> {
    let credentials = helpers::credential_layers(env, &config.providers);

    let dispatcher = Dispatcher::new(Arc::new(credentials))
        .context("failed to build HTTP client")?
        .with_endpoint_overrides(&config.providers);

    debug!(?dispatcher, "Dispatcher ready");
    Ok(Arc::new(dispatcher))
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("pingyu=debug,pingyu_providers=debug,pingyu_core=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

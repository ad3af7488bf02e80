//! `pingyu onboard` — create a default config file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use pingyu_core::config::{get_config_path, save_config, Config};
use pingyu_providers::PROVIDERS;

/// Run the onboard command.
pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    let path = config_path.unwrap_or_else(get_config_path);

    println!();
    println!("{}", "📝 Pingyu — Setup".cyan().bold());
    println!();

    if write_default_config(&path)? {
        println!("  {} created config at {}", "✓".green(), path.display());
    } else {
        println!("  {} config already exists at {}", "✓".green(), path.display());
    }

    println!();
    println!("  Add at least one API key, either in the config file or as env vars:");
    for spec in PROVIDERS {
        println!("    {:<20} {}", spec.display_name, spec.env_key.yellow());
    }
    println!();
    println!(
        "{}",
        "  Setup complete! Run `pingyu generate -n <name> -i <info>` to write a comment.".green()
    );
    println!();

    Ok(())
}

/// Write `Config::default()` to `path` unless a file is already there.
///
/// Returns whether a file was written.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write config to {}", path.display()))?;
    Ok(true)
}

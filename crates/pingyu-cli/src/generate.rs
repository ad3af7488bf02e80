//! `pingyu generate` — one comment for one student.

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

use pingyu_core::config::Config;
use pingyu_providers::CommentGenerator;

use crate::helpers;

/// Provider to use: the explicit flag if non-blank, else the config default.
///
/// The dispatcher never guesses a provider; the default is applied here.
pub fn pick_provider(explicit: Option<&str>, config: &Config) -> String {
    explicit
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(config.defaults.provider.as_str())
        .to_string()
}

/// Run the generate command.
pub async fn run(
    generator: &dyn CommentGenerator,
    provider: &str,
    student_name: &str,
    student_info: &str,
) -> Result<()> {
    info!(provider, student = student_name, "generating comment");

    match generator
        .generate_comment(provider, student_name, student_info)
        .await
    {
        Ok(comment) => {
            helpers::print_comment(provider, student_name, &comment);
            Ok(())
        }
        Err(e) => {
            eprintln!(
                "  {} [{}] {}",
                "✗".red(),
                e.kind().as_str(),
                helpers::error_hint(&e).dimmed()
            );
            Err(e).with_context(|| format!("failed to generate a comment for {student_name}"))
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

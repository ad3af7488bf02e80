//! `pingyu probe` — smoke-test every provider with one sample student.
//!
//! Providers are tried one after another; a failure is reported and the
//! probe moves on. The command fails only when no provider succeeds.

use anyhow::{bail, Result};
use colored::Colorize;

use pingyu_providers::{CommentGenerator, DispatchError, ProviderKind};

use crate::helpers;

pub const SAMPLE_NAME: &str = "张三";
pub const SAMPLE_INFO: &str = "性格开朗，成绩优秀，积极参加班级活动，乐于助人";

/// Result of probing one provider.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub provider: ProviderKind,
    pub result: Result<String, DispatchError>,
}

/// Try every provider in registry order.
pub async fn probe_all(
    generator: &dyn CommentGenerator,
    student_name: &str,
    student_info: &str,
) -> Vec<ProbeOutcome> {
    let mut outcomes = Vec::with_capacity(ProviderKind::ALL.len());
    for provider in ProviderKind::ALL {
        let result = generator
            .generate_comment(provider.name(), student_name, student_info)
            .await;
        outcomes.push(ProbeOutcome { provider, result });
    }
    outcomes
}

/// Run the probe command.
pub async fn run(
    generator: &dyn CommentGenerator,
    student_name: &str,
    student_info: &str,
) -> Result<()> {
    println!();
    println!("{}", "📝 Pingyu — provider probe".cyan().bold());
    println!("  {} / {}", student_name, student_info.dimmed());
    println!();

    let outcomes = probe_all(generator, student_name, student_info).await;

    for (i, outcome) in outcomes.iter().enumerate() {
        let label = format!("[{}] {}", i + 1, outcome.provider.spec().display_name);
        match &outcome.result {
            Ok(comment) => {
                println!("  {} {}", "✓".green(), label.bold());
                println!("{comment}");
            }
            Err(e) => {
                println!("  {} {} — {}", "✗".red(), label.bold(), e);
                println!("      {}", helpers::error_hint(e).dimmed());
            }
        }
        println!();
    }

    let ok = outcomes.iter().filter(|o| o.result.is_ok()).count();
    println!("  {ok}/{} providers OK", outcomes.len());
    println!();

    if ok == 0 {
        bail!("no provider produced a comment");
    }
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

//! Journal consumption — `ds-revert revert` and `ds-revert cleanup`.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use ds_revert::RunSummary;
use ds_revert::config::Config;
use ds_revert::process::{Mode, Process};

pub fn cmd_revert(repo_dir: &Path, force: bool) -> Result<()> {
    run(repo_dir, Mode::Revert { force })
}

pub fn cmd_cleanup(repo_dir: &Path) -> Result<()> {
    run(repo_dir, Mode::Cleanup)
}

fn run(repo_dir: &Path, mode: Mode) -> Result<()> {
    let config = Config::load(repo_dir)?;
    let process = Process::new(config);

    let summary = process.run(mode).with_context(|| {
        format!(
            "{} of {} stopped",
            capitalize(&mode.to_string()),
            process.config().repo_dir.display()
        )
    })?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    if summary.consumed == 0 {
        println!("Nothing to {}: no conversion journal", summary.mode);
        return;
    }

    println!(
        "{} {} finished: {} step(s) consumed, {} applied",
        style("✓").green(),
        capitalize(&summary.mode.to_string()),
        summary.consumed,
        summary.applied
    );
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

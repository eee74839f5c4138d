//! Journal inspection — `ds-revert status`.

use anyhow::Result;
use console::style;
use std::path::Path;

use ds_revert::RevertError;
use ds_revert::config::Config;
use ds_revert::journal::{Action, Journal};
use ds_revert::lock::RepoLock;

pub fn cmd_status(repo_dir: &Path) -> Result<()> {
    let config = Config::load(repo_dir)?;

    println!();
    println!("Repository: {}", config.repo_dir.display());

    match RepoLock::try_acquire(&config.lock_path) {
        Ok(_) => println!("Lock:       free"),
        Err(RevertError::LockHeld { .. }) => match RepoLock::holder(&config.lock_path) {
            Some(holder) => println!(
                "Lock:       held by pid {} since {}",
                holder.pid,
                holder.acquired_at.to_rfc3339()
            ),
            None => println!("Lock:       held"),
        },
        Err(e) => return Err(e.into()),
    }

    let journal = Journal::load(&config.journal_path)?;
    if journal.is_empty() {
        println!();
        println!("No conversion journal. Nothing to revert or clean up.");
        println!();
        return Ok(());
    }

    let state = if journal.top().map(|s| s.action()) == Some(&Action::Done) {
        style("completed (revert needs --force, cleanup available)").green()
    } else {
        style("interrupted (revert available)").yellow()
    };
    println!("Journal:    {}", config.journal_path.display());
    println!("Conversion: {}", state);
    println!();
    println!("{} pending step(s), newest first:", journal.len());

    for (i, step) in journal.iter().rev().enumerate() {
        println!("  {:>3}. {}", i + 1, step);
    }
    println!();
    Ok(())
}

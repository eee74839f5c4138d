use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cmd;

#[derive(Parser)]
#[command(name = "ds-revert")]
#[command(version, about = "Revert or clean up an on-disk repository conversion")]
pub struct Cli {
    /// Log every step at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Repository directory (defaults to the current directory)
    #[arg(long, global = true)]
    pub repo: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Undo the conversion recorded in the repository journal
    Revert {
        /// Also undo a conversion that completed successfully
        #[arg(long)]
        force: bool,
    },
    /// Delete backups kept by a completed conversion
    Cleanup,
    /// Show the pending journal without changing anything
    Status,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let repo_dir = match cli.repo.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Revert { force } => cmd::cmd_revert(&repo_dir, *force)?,
        Commands::Cleanup => cmd::cmd_cleanup(&repo_dir)?,
        Commands::Status => cmd::cmd_status(&repo_dir)?,
    }

    Ok(())
}

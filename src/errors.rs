//! Typed error hierarchy for revert and cleanup runs.
//!
//! Every variant aborts the current run. The ones carrying paths name the
//! exact filesystem location that disagreed with the journal so an operator
//! can fix it by hand and re-run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the journal, the lock, the engines and the orchestrator.
#[derive(Debug, Error)]
pub enum RevertError {
    #[error("Invalid configuration for repository {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Repository is locked by another process ({path})")]
    LockHeld { path: PathBuf },

    #[error("Failed to acquire repository lock at {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read conversion journal at {path}: {source}")]
    JournalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Conversion journal {path} is corrupt at line {line}: {reason}")]
    JournalCorrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Conversion journal already exists at {path}; revert or clean up first")]
    JournalExists { path: PathBuf },

    #[error("Last conversion was successful, run with --force to revert")]
    AlreadyDone,

    #[error("Step '{action}' expects {expected} argument(s), found {actual}")]
    ArgumentCount {
        action: String,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot move: source '{path}' does not exist")]
    SourceMissing { path: PathBuf },

    #[error("Cannot move: destination '{path}' already exists")]
    DestinationExists { path: PathBuf },

    #[error("Cannot create directory: '{path}' already exists")]
    AlreadyExists { path: PathBuf },

    #[error("Cannot clean up after an incomplete conversion (newest step is '{action}')")]
    IncompleteConversion { action: String },

    #[error("Unknown journal step '{action}'")]
    UnknownStep { action: String },

    #[error("Failed to persist conversion journal at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Step '{action}' failed on {args:?}: {source}")]
    Filesystem {
        action: String,
        args: Vec<String>,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = RevertError> = std::result::Result<T, E>;

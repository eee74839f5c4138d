//! Step interpreters.
//!
//! | Engine          | Used by                 | Acts on                          |
//! |-----------------|-------------------------|----------------------------------|
//! | `RevertEngine`  | `ds-revert revert`      | `remove`, `move`, `mkdir`        |
//! | `CleanupEngine` | `ds-revert cleanup`     | `cleanup`                        |
//!
//! Both see journal entries newest first and abort on the first failure.

pub mod cleanup;
pub mod revert;

pub use cleanup::CleanupEngine;
pub use revert::RevertEngine;

use std::fs;
use std::io;
use std::path::Path;

use crate::errors::{Result, RevertError};
use crate::journal::Step;

/// What executing a step did to the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The step changed the filesystem.
    Applied,
    /// The step was acknowledged without any filesystem effect.
    Skipped,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Applied => write!(f, "ok"),
            Outcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// Interprets one journal entry at a time.
pub trait StepEngine {
    fn execute(&mut self, step: &Step) -> Result<Outcome>;
}

/// Recursively delete `path`, whether file, symlink or directory. A path that
/// is already gone counts as deleted.
pub(crate) fn remove_all(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Whether anything (including a dangling symlink) occupies `path`.
/// Errors other than "not found" count as occupied.
pub(crate) fn occupied(path: &Path) -> bool {
    !matches!(fs::symlink_metadata(path), Err(e) if e.kind() == io::ErrorKind::NotFound)
}

pub(crate) fn fs_err(step: &Step, source: io::Error) -> RevertError {
    RevertError::Filesystem {
        action: step.action().to_string(),
        args: step.args().to_vec(),
        source,
    }
}

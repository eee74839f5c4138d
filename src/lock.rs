//! Exclusive repository lock.
//!
//! An OS advisory lock on `<repo>/repo.lock`, taken without blocking. The
//! lock is released when the [`RepoLock`] is dropped, so every exit path of a
//! run gives it back.

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{Result, RevertError};

/// Default lock file name inside the repository root.
pub const LOCK_FILE: &str = "repo.lock";

/// Diagnostic record written into the lock file while it is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    pub pid: u32,
    pub acquired_at: DateTime<Utc>,
}

/// A held repository lock.
#[derive(Debug)]
pub struct RepoLock {
    file: File,
    path: PathBuf,
}

impl RepoLock {
    /// Take the lock at `path`, failing immediately with
    /// [`RevertError::LockHeld`] if another holder has it.
    pub fn try_acquire(path: &Path) -> Result<Self> {
        let lock_err = |source| RevertError::Lock {
            path: path.to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(lock_err)?;

        if let Err(e) = file.try_lock_exclusive() {
            if is_contended(&e) {
                debug!(lock = %path.display(), "lock held by another process");
                return Err(RevertError::LockHeld {
                    path: path.to_path_buf(),
                });
            }
            return Err(lock_err(e));
        }

        let lock = Self {
            file,
            path: path.to_path_buf(),
        };
        if let Err(e) = lock.write_holder() {
            debug!(lock = %path.display(), error = %e, "failed to record lock holder");
        }

        debug!(lock = %path.display(), "acquired repository lock");
        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Holder information recorded in the lock file at `path`, if any.
    pub fn holder(path: &Path) -> Option<LockHolder> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn write_holder(&self) -> std::io::Result<()> {
        let holder = LockHolder {
            pid: std::process::id(),
            acquired_at: Utc::now(),
        };
        let json = serde_json::to_string(&holder)?;

        self.file.set_len(0)?;
        let mut file = &self.file;
        file.write_all(json.as_bytes())?;
        file.sync_data()
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.set_len(0) {
            debug!(error = %e, "failed to clear lock holder");
        }
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(error = %e, "failed to release repository lock");
        }
        debug!(lock = %self.path.display(), "released repository lock");
    }
}

fn is_contended(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

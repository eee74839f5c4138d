//! Repository configuration.
//!
//! Paths are resolved in layers, later layers winning:
//!
//! 1. built-in defaults (`convertlog`, `repo.lock`)
//! 2. `<repo>/ds-revert.toml`
//! 3. environment (`DS_REVERT_JOURNAL`, `DS_REVERT_LOCK`)
//! 4. the `--repo` flag, which picks the repository itself
//!
//! ```toml
//! [journal]
//! file = "convertlog"
//!
//! [lock]
//! file = "repo.lock"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::errors::RevertError;
use crate::journal::JOURNAL_FILE;
use crate::lock::LOCK_FILE;

/// Optional per-repository configuration file name.
pub const CONFIG_FILE: &str = "ds-revert.toml";

pub const JOURNAL_ENV: &str = "DS_REVERT_JOURNAL";
pub const LOCK_ENV: &str = "DS_REVERT_LOCK";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSection {
    /// File name relative to the repository root.
    #[serde(default)]
    pub file: Option<String>,
}

/// Contents of `ds-revert.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub journal: FileSection,
    #[serde(default)]
    pub lock: FileSection,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid ds-revert configuration")
    }

    pub fn load_or_default(repo_dir: &Path) -> Result<Self> {
        let path = repo_dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Journal file name after applying the environment override.
    pub fn journal_file(&self) -> String {
        resolve(
            self.journal.file.as_deref(),
            std::env::var(JOURNAL_ENV).ok(),
            JOURNAL_FILE,
        )
    }

    /// Lock file name after applying the environment override.
    pub fn lock_file(&self) -> String {
        resolve(
            self.lock.file.as_deref(),
            std::env::var(LOCK_ENV).ok(),
            LOCK_FILE,
        )
    }

    /// Problems with the resolved file names, empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let journal = self.journal_file();
        let lock = self.lock_file();

        let mut issues: Vec<String> = [("journal", &journal), ("lock", &lock)]
            .into_iter()
            .filter(|(_, name)| !is_plain_file_name(name))
            .map(|(kind, name)| format!("{} file '{}' must be a plain file name", kind, name))
            .collect();

        if journal == lock {
            issues.push(format!(
                "journal and lock must be different files (both '{}')",
                journal
            ));
        }
        issues
    }
}

fn resolve(file_value: Option<&str>, env_value: Option<String>, default: &str) -> String {
    env_value
        .filter(|v| !v.is_empty())
        .or_else(|| file_value.map(str::to_string))
        .unwrap_or_else(|| default.to_string())
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Resolved locations for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub repo_dir: PathBuf,
    pub journal_path: PathBuf,
    pub lock_path: PathBuf,
}

impl Config {
    /// Built-in defaults for `repo_dir`; reads nothing from disk or the
    /// environment. [`Config::resolve`] is what the library entry points use.
    pub fn for_repo(repo_dir: &Path) -> Self {
        Self {
            repo_dir: repo_dir.to_path_buf(),
            journal_path: repo_dir.join(JOURNAL_FILE),
            lock_path: repo_dir.join(LOCK_FILE),
        }
    }

    /// Resolve all layers for `repo_dir`, which must exist.
    pub fn load(repo_dir: &Path) -> Result<Self> {
        let repo_dir = repo_dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve repository {}", repo_dir.display()))?;
        anyhow::ensure!(
            repo_dir.is_dir(),
            "Repository path {} is not a directory",
            repo_dir.display()
        );

        let file = ConfigFile::load_or_default(&repo_dir)?;
        let issues = file.validate();
        if !issues.is_empty() {
            anyhow::bail!("Invalid configuration: {}", issues.join("; "));
        }

        Ok(Self {
            journal_path: repo_dir.join(file.journal_file()),
            lock_path: repo_dir.join(file.lock_file()),
            repo_dir,
        })
    }

    /// [`Config::load`] with the failure folded into [`RevertError::Config`].
    pub fn resolve(repo_dir: &Path) -> crate::errors::Result<Self> {
        Self::load(repo_dir).map_err(|e| RevertError::Config {
            path: repo_dir.to_path_buf(),
            reason: format!("{:#}", e),
        })
    }
}

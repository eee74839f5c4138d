//! The conversion journal: an ordered, persisted record of the filesystem
//! steps a forward conversion performed.
//!
//! Steps are appended in chronological order and consumed as a stack: the
//! most recently appended step is the *top* and is undone first. A
//! successful conversion seals the journal with a [`Action::Done`] marker,
//! which therefore sits on top.
//!
//! ```text
//! <repo>/
//! ├── convertlog     # this journal (see `format` for the encoding)
//! └── repo.lock      # exclusive lock held while the journal is consumed
//! ```

pub mod format;
pub mod recorder;

pub use recorder::JournalRecorder;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Result, RevertError};

/// Default journal file name inside the repository root.
pub const JOURNAL_FILE: &str = "convertlog";

/// Path of the default journal for a repository.
pub fn journal_path(repo_dir: &Path) -> PathBuf {
    repo_dir.join(JOURNAL_FILE)
}

/// The action tag of a journal step.
///
/// Tags that this build does not know are kept as [`Action::Unknown`] so the
/// engines can reject them at execution time rather than refusing to load
/// the journal at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    /// The forward conversion completed.
    Done,
    /// Recursively delete a path.
    Remove,
    /// Rename `args[0]` to `args[1]`.
    Move,
    /// Create a directory and its parents.
    Mkdir,
    /// Backup artifact to delete once the conversion is confirmed.
    Cleanup,
    Unknown(String),
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Done => "done",
            Action::Remove => "remove",
            Action::Move => "move",
            Action::Mkdir => "mkdir",
            Action::Cleanup => "cleanup",
            Action::Unknown(tag) => tag,
        }
    }
}

impl From<&str> for Action {
    fn from(tag: &str) -> Self {
        match tag {
            "done" => Action::Done,
            "remove" => Action::Remove,
            "move" => Action::Move,
            "mkdir" => Action::Mkdir,
            "cleanup" => Action::Cleanup,
            other => Action::Unknown(other.to_string()),
        }
    }
}

impl From<String> for Action {
    fn from(tag: String) -> Self {
        Action::from(tag.as_str())
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.as_str().to_string()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded filesystem step. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    action: Action,
    #[serde(default)]
    args: Vec<String>,
}

impl Step {
    pub fn new<I, S>(action: Action, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn done() -> Self {
        Self::new(Action::Done, Vec::<String>::new())
    }

    pub fn remove(path: impl AsRef<Path>) -> Self {
        Self::new(Action::Remove, [path_arg(path.as_ref())])
    }

    /// A rename from `source` to `destination`, recorded in undo-ready order.
    pub fn rename(source: impl AsRef<Path>, destination: impl AsRef<Path>) -> Self {
        Self::new(
            Action::Move,
            [path_arg(source.as_ref()), path_arg(destination.as_ref())],
        )
    }

    pub fn mkdir(path: impl AsRef<Path>) -> Self {
        Self::new(Action::Mkdir, [path_arg(path.as_ref())])
    }

    pub fn cleanup(path: impl AsRef<Path>) -> Self {
        Self::new(Action::Cleanup, [path_arg(path.as_ref())])
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Borrow the arguments as a fixed-size array, failing with
    /// [`RevertError::ArgumentCount`] when the step carries a different count.
    pub fn args_exact<const N: usize>(&self) -> Result<&[String; N]> {
        <&[String; N]>::try_from(self.args.as_slice()).map_err(|_| RevertError::ArgumentCount {
            action: self.action.to_string(),
            expected: N,
            actual: self.args.len(),
        })
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.action)?;
        for arg in &self.args {
            write!(f, " '{}'", arg)?;
        }
        Ok(())
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// The in-memory view of a persisted journal, consumed from its tail.
///
/// Every mutation is written back to disk before the call returns, and a
/// failed write leaves the in-memory state exactly as it was.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    steps: Vec<Step>,
}

impl Journal {
    /// Load the journal at `path`. A missing file is an empty journal.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(RevertError::JournalRead {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let steps = format::decode_bytes(path, &content)?;
        Ok(Self {
            path: path.to_path_buf(),
            steps,
        })
    }

    /// An unsaved journal holding `steps` (oldest first).
    pub fn with_steps(path: &Path, steps: Vec<Step>) -> Self {
        Self {
            path: path.to_path_buf(),
            steps,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Step> {
        self.steps.iter()
    }

    /// The most recently appended step still present, `None` once drained.
    pub fn top(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// The step directly beneath the top.
    pub fn beneath_top(&self) -> Option<&Step> {
        self.steps.len().checked_sub(2).map(|i| &self.steps[i])
    }

    /// Remove the top step and persist the result.
    pub fn pop(&mut self) -> Result<Option<Step>> {
        let Some(step) = self.steps.pop() else {
            return Ok(None);
        };

        if let Err(e) = self.write() {
            self.steps.push(step);
            return Err(e);
        }
        Ok(Some(step))
    }

    /// Remove the step directly beneath the top and persist the result,
    /// leaving the top in place.
    pub fn pop_beneath_top(&mut self) -> Result<Option<Step>> {
        let Some(index) = self.steps.len().checked_sub(2) else {
            return Ok(None);
        };

        let step = self.steps.remove(index);
        if let Err(e) = self.write() {
            self.steps.insert(index, step);
            return Err(e);
        }
        Ok(Some(step))
    }

    /// Rewrite the whole journal. A drained journal removes the file.
    pub fn write(&self) -> Result<()> {
        let persisted = if self.steps.is_empty() {
            match fs::remove_file(&self.path) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            }
        } else {
            format::write_atomic(&self.path, &self.steps)
        };

        persisted.map_err(|source| RevertError::Persist {
            path: self.path.clone(),
            source,
        })
    }
}

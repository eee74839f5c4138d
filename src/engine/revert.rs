//! Undo a conversion by replaying its journal backward.

use std::fs;
use std::path::Path;

use super::{Outcome, StepEngine, fs_err, occupied, remove_all};
use crate::errors::{Result, RevertError};
use crate::journal::{Action, Step};

/// Reverts journal entries.
///
/// Arguments are stored in undo-ready order by the forward phase, so each
/// step is executed as written: `move a b` renames `a` back to `b`, `mkdir d`
/// recreates a directory the conversion deleted, `remove p` deletes something
/// the conversion created.
#[derive(Debug, Clone, Copy, Default)]
pub struct RevertEngine {
    force: bool,
}

impl RevertEngine {
    /// With `force`, a `done` marker is passed over instead of refused.
    pub fn new(force: bool) -> Self {
        Self { force }
    }

    fn remove(&self, step: &Step) -> Result<Outcome> {
        let [path] = step.args_exact::<1>()?;
        remove_all(Path::new(path)).map_err(|e| fs_err(step, e))?;
        Ok(Outcome::Applied)
    }

    fn rename(&self, step: &Step) -> Result<Outcome> {
        let [source, destination] = step.args_exact::<2>()?;
        let (source, destination) = (Path::new(source), Path::new(destination));

        if !occupied(source) {
            return Err(RevertError::SourceMissing {
                path: source.to_path_buf(),
            });
        }
        if occupied(destination) {
            return Err(RevertError::DestinationExists {
                path: destination.to_path_buf(),
            });
        }

        fs::rename(source, destination).map_err(|e| fs_err(step, e))?;
        Ok(Outcome::Applied)
    }

    fn mkdir(&self, step: &Step) -> Result<Outcome> {
        let [path] = step.args_exact::<1>()?;
        let path = Path::new(path);

        if occupied(path) {
            return Err(RevertError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }

        fs::create_dir_all(path).map_err(|e| fs_err(step, e))?;
        Ok(Outcome::Applied)
    }
}

impl StepEngine for RevertEngine {
    fn execute(&mut self, step: &Step) -> Result<Outcome> {
        match step.action() {
            Action::Done if self.force => Ok(Outcome::Skipped),
            Action::Done => Err(RevertError::AlreadyDone),
            Action::Remove => self.remove(step),
            Action::Move => self.rename(step),
            Action::Mkdir => self.mkdir(step),
            Action::Cleanup => Ok(Outcome::Skipped),
            Action::Unknown(tag) => Err(RevertError::UnknownStep {
                action: tag.clone(),
            }),
        }
    }
}

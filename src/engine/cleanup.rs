//! Purge backup artifacts of a conversion that is known to have succeeded.

use std::path::Path;

use super::{Outcome, StepEngine, fs_err, remove_all};
use crate::errors::{Result, RevertError};
use crate::journal::{Action, Step};

/// Deletes the paths named by `cleanup` entries and acknowledges every other
/// known step without touching the filesystem.
///
/// The first entry it is handed must be the `done` marker; a journal that
/// does not end in `done` belongs to an interrupted conversion whose backups
/// are still needed for a revert.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupEngine {
    consumed: usize,
}

impl CleanupEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries executed successfully so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    fn dispatch(&self, step: &Step) -> Result<Outcome> {
        match step.action() {
            Action::Done | Action::Remove | Action::Move | Action::Mkdir => Ok(Outcome::Skipped),
            Action::Cleanup => {
                let [path] = step.args_exact::<1>()?;
                remove_all(Path::new(path)).map_err(|e| fs_err(step, e))?;
                Ok(Outcome::Applied)
            }
            Action::Unknown(tag) => Err(RevertError::UnknownStep {
                action: tag.clone(),
            }),
        }
    }
}

impl StepEngine for CleanupEngine {
    fn execute(&mut self, step: &Step) -> Result<Outcome> {
        if self.consumed == 0 && step.action() != &Action::Done {
            return Err(RevertError::IncompleteConversion {
                action: step.action().to_string(),
            });
        }

        let outcome = self.dispatch(step)?;
        self.consumed += 1;
        Ok(outcome)
    }
}

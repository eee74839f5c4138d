//! Append side of the journal, used by a forward conversion.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{Step, format};
use crate::errors::{Result, RevertError};

/// Appends steps to a fresh journal as the forward conversion performs them.
///
/// Each record is flushed to disk before `record` returns, so a crash at any
/// point leaves a journal describing every mutation made so far.
pub struct JournalRecorder {
    path: PathBuf,
    file: File,
}

impl JournalRecorder {
    /// Start a new journal at `path`.
    ///
    /// Fails with [`RevertError::JournalExists`] when a journal is already
    /// there: the previous conversion has to be reverted or cleaned up first.
    pub fn create(path: &Path) -> Result<Self> {
        let persist_err = |source| RevertError::Persist {
            path: path.to_path_buf(),
            source,
        };

        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(RevertError::JournalExists {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(persist_err(e)),
        };

        writeln!(file, "{}", format::HEADER).map_err(persist_err)?;
        file.sync_all().map_err(persist_err)?;
        format::sync_parent(path);

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Append one step.
    pub fn record(&mut self, step: &Step) -> Result<()> {
        let persist_err = |source| RevertError::Persist {
            path: self.path.clone(),
            source,
        };

        let line = format::encode_record(step).map_err(|e| persist_err(e.into()))?;
        writeln!(self.file, "{}", line).map_err(persist_err)?;
        self.file.sync_data().map_err(persist_err)?;

        tracing::debug!(step = %step, journal = %self.path.display(), "recorded step");
        Ok(())
    }

    /// Seal the journal with the `done` marker.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.record(&Step::done())?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{Journal, journal_path};
    use tempfile::TempDir;

    #[test]
    fn test_recorded_steps_load_in_order() {
        let dir = TempDir::new().unwrap();
        let path = journal_path(dir.path());

        let mut recorder = JournalRecorder::create(&path).unwrap();
        recorder.record(&Step::mkdir("/repo/blocks")).unwrap();
        recorder.record(&Step::cleanup("/repo/blocks.bak")).unwrap();
        recorder.finish().unwrap();

        let journal = Journal::load(&path).unwrap();
        let steps: Vec<_> = journal.iter().cloned().collect();
        assert_eq!(
            steps,
            vec![
                Step::mkdir("/repo/blocks"),
                Step::cleanup("/repo/blocks.bak"),
                Step::done()
            ]
        );
        assert_eq!(journal.top(), Some(&Step::done()));
    }

    #[test]
    fn test_unfinished_journal_has_no_done_marker() {
        let dir = TempDir::new().unwrap();
        let path = journal_path(dir.path());

        let mut recorder = JournalRecorder::create(&path).unwrap();
        recorder.record(&Step::remove("/repo/tmp")).unwrap();
        drop(recorder);

        let journal = Journal::load(&path).unwrap();
        assert_eq!(journal.top(), Some(&Step::remove("/repo/tmp")));
    }

    #[test]
    fn test_create_refuses_existing_journal() {
        let dir = TempDir::new().unwrap();
        let path = journal_path(dir.path());
        JournalRecorder::create(&path).unwrap().finish().unwrap();

        let err = JournalRecorder::create(&path).err().unwrap();
        assert!(matches!(err, RevertError::JournalExists { .. }));
    }
}

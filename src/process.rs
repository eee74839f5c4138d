//! The revert/cleanup orchestrator.
//!
//! A run holds the repository lock for its whole lifetime, loads the journal,
//! and feeds entries newest first to the engine for its [`Mode`]. An entry is
//! removed from the persisted journal only after the engine has applied it,
//! so a crashed or failed run can simply be started again.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::engine::{CleanupEngine, Outcome, RevertEngine, StepEngine};
use crate::errors::Result;
use crate::journal::{Journal, Step};
use crate::lock::RepoLock;
use crate::report::{Reporter, TracingReporter};

/// Which way the journal is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Undo the conversion. `force` permits undoing a completed one.
    Revert { force: bool },
    /// Delete backup artifacts of a completed conversion.
    Cleanup,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Revert { .. } => write!(f, "revert"),
            Mode::Cleanup => write!(f, "cleanup"),
        }
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub mode: Mode,
    /// Journal entries executed and removed.
    pub consumed: usize,
    /// Entries among those that changed the filesystem.
    pub applied: usize,
}

impl RunSummary {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            consumed: 0,
            applied: 0,
        }
    }

    fn record(&mut self, outcome: Outcome) {
        self.consumed += 1;
        if outcome == Outcome::Applied {
            self.applied += 1;
        }
    }
}

pub struct Process {
    config: Config,
    reporter: Arc<dyn Reporter>,
}

impl Process {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            reporter: Arc::new(TracingReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drain the journal in `mode`. Stops at the first failing step; the
    /// lock is released on every return path.
    pub fn run(&self, mode: Mode) -> Result<RunSummary> {
        let _lock = RepoLock::try_acquire(&self.config.lock_path)?;
        let mut journal = Journal::load(&self.config.journal_path)?;

        self.reporter
            .run_started(mode, &self.config.repo_dir, journal.len());

        let mut summary = RunSummary::new(mode);
        match mode {
            Mode::Revert { force } => {
                self.drain(&mut journal, &mut RevertEngine::new(force), &mut summary)?
            }
            Mode::Cleanup => {
                self.drain_beneath_marker(&mut journal, &mut CleanupEngine::new(), &mut summary)?
            }
        }

        journal.write()?;
        self.reporter.run_finished(&summary);
        Ok(summary)
    }

    fn drain(
        &self,
        journal: &mut Journal,
        engine: &mut dyn StepEngine,
        summary: &mut RunSummary,
    ) -> Result<()> {
        while let Some(step) = journal.top().cloned() {
            self.execute(engine, &step, summary)?;
            journal.pop()?;
        }
        Ok(())
    }

    /// Like `drain`, but the top entry is removed last. Cleanup checks that
    /// the top is the `done` marker; keeping it in place until the end means
    /// an interrupted cleanup still passes that check when re-run.
    fn drain_beneath_marker(
        &self,
        journal: &mut Journal,
        engine: &mut dyn StepEngine,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let Some(marker) = journal.top().cloned() else {
            return Ok(());
        };
        self.execute(engine, &marker, summary)?;

        while let Some(step) = journal.beneath_top().cloned() {
            self.execute(engine, &step, summary)?;
            journal.pop_beneath_top()?;
        }

        journal.pop()?;
        Ok(())
    }

    fn execute(
        &self,
        engine: &mut dyn StepEngine,
        step: &Step,
        summary: &mut RunSummary,
    ) -> Result<()> {
        self.reporter.step_started(step);
        match engine.execute(step) {
            Ok(outcome) => {
                self.reporter.step_finished(step, outcome);
                summary.record(outcome);
                Ok(())
            }
            Err(e) => {
                self.reporter.step_failed(step, &e);
                Err(e)
            }
        }
    }
}

/// Undo the conversion recorded in `repo_dir`'s journal. The journal and
/// lock locations honour `ds-revert.toml` and the environment, as the CLI does.
pub fn revert(repo_dir: &Path, force: bool) -> Result<RunSummary> {
    Process::new(Config::resolve(repo_dir)?).run(Mode::Revert { force })
}

/// Delete the backup artifacts of the completed conversion in `repo_dir`.
pub fn cleanup(repo_dir: &Path) -> Result<RunSummary> {
    Process::new(Config::resolve(repo_dir)?).run(Mode::Cleanup)
}

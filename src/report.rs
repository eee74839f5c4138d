//! Progress reporting for revert and cleanup runs.
//!
//! The orchestrator is handed a [`Reporter`] rather than writing to a global
//! logger. [`TracingReporter`] is the default and emits structured `tracing`
//! events; [`RecordingReporter`] keeps events in memory for inspection.

use std::path::Path;
use std::sync::Mutex;

use tracing::{info, warn};

use crate::engine::Outcome;
use crate::errors::RevertError;
use crate::journal::Step;
use crate::process::{Mode, RunSummary};

pub trait Reporter {
    fn run_started(&self, mode: Mode, repo: &Path, pending: usize);
    fn step_started(&self, step: &Step);
    fn step_finished(&self, step: &Step, outcome: Outcome);
    fn step_failed(&self, step: &Step, error: &RevertError);
    fn run_finished(&self, summary: &RunSummary);
}

/// Emits one `tracing` event per run and step transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn run_started(&self, mode: Mode, repo: &Path, pending: usize) {
        info!(%mode, repo = %repo.display(), pending, "start {}", mode);
    }

    fn step_started(&self, step: &Step) {
        info!(action = %step.action(), args = ?step.args(), "{}", step);
    }

    fn step_finished(&self, step: &Step, outcome: Outcome) {
        info!(action = %step.action(), %outcome, "\\-> {}", outcome);
    }

    fn step_failed(&self, step: &Step, error: &RevertError) {
        warn!(action = %step.action(), args = ?step.args(), %error, "\\-> failed");
    }

    fn run_finished(&self, summary: &RunSummary) {
        info!(
            mode = %summary.mode,
            consumed = summary.consumed,
            applied = summary.applied,
            "all tasks finished"
        );
    }
}

/// A single reported event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RunStarted { mode: Mode, pending: usize },
    StepStarted(Step),
    StepFinished(Step, Outcome),
    StepFailed(Step, String),
    RunFinished(RunSummary),
}

/// Keeps every event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    fn push(&self, event: Event) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        // A panic while holding the guard cannot leave the Vec half-updated.
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Reporter for RecordingReporter {
    fn run_started(&self, mode: Mode, _repo: &Path, pending: usize) {
        self.push(Event::RunStarted { mode, pending });
    }

    fn step_started(&self, step: &Step) {
        self.push(Event::StepStarted(step.clone()));
    }

    fn step_finished(&self, step: &Step, outcome: Outcome) {
        self.push(Event::StepFinished(step.clone(), outcome));
    }

    fn step_failed(&self, step: &Step, error: &RevertError) {
        self.push(Event::StepFailed(step.clone(), error.to_string()));
    }

    fn run_finished(&self, summary: &RunSummary) {
        self.push(Event::RunFinished(summary.clone()));
    }
}

//! Crash-consistent revert and cleanup of on-disk repository conversions.
//!
//! A forward conversion records every filesystem step it takes in a journal
//! (see [`journal::JournalRecorder`]). If the conversion is interrupted, or
//! turns out to be unwanted, [`revert`] replays that journal backward. Once a
//! conversion is confirmed, [`cleanup`] deletes the backups it kept.

pub mod config;
pub mod engine;
pub mod errors;
pub mod journal;
pub mod lock;
pub mod process;
pub mod report;

pub use errors::{Result, RevertError};
pub use process::{Mode, Process, RunSummary, cleanup, revert};

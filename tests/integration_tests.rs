//! Integration tests for ds-revert
//!
//! These drive the binary against real temporary repositories whose journals
//! are written through the library's recorder.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use ds_revert::journal::{JournalRecorder, Step, journal_path};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a ds-revert Command pointed at `repo`
fn ds_revert(repo: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("ds-revert");
    cmd.arg("--repo")
        .arg(repo)
        .env_remove("DS_REVERT_JOURNAL")
        .env_remove("DS_REVERT_LOCK")
        .env_remove("RUST_LOG");
    cmd
}

/// A repository converted from `old/` to `new/old/`, with a config backup.
fn converted_repo(finish: bool) -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("old")).unwrap();
    fs::write(root.join("old/data"), "payload").unwrap();
    fs::write(root.join("config"), "v1").unwrap();

    let mut recorder = JournalRecorder::create(&journal_path(root)).unwrap();

    fs::create_dir(root.join("new")).unwrap();
    recorder.record(&Step::remove(root.join("new"))).unwrap();

    fs::rename(root.join("old"), root.join("new/old")).unwrap();
    recorder
        .record(&Step::rename(root.join("new/old"), root.join("old")))
        .unwrap();

    fs::copy(root.join("config"), root.join("config.bak")).unwrap();
    recorder.record(&Step::cleanup(root.join("config.bak"))).unwrap();

    if finish {
        recorder.finish().unwrap();
    }
    dir
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        cargo_bin_cmd!("ds-revert").arg("--help").assert().success();
    }

    #[test]
    fn test_version() {
        cargo_bin_cmd!("ds-revert")
            .arg("--version")
            .assert()
            .success();
    }

    #[test]
    fn test_missing_repo_fails() {
        let dir = TempDir::new().unwrap();
        ds_revert(&dir.path().join("missing"))
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to resolve repository"));
    }
}

// =============================================================================
// Status
// =============================================================================

mod status {
    use super::*;

    #[test]
    fn test_status_without_journal() {
        let dir = TempDir::new().unwrap();
        ds_revert(dir.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No conversion journal"));
    }

    #[test]
    fn test_status_lists_steps_newest_first() {
        let dir = converted_repo(true);
        let output = ds_revert(dir.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("4 pending step(s)"))
            .stdout(predicate::str::contains("completed"))
            .get_output()
            .stdout
            .clone();

        let text = String::from_utf8(output).unwrap();
        let done = text.find("1. done").unwrap();
        let cleanup = text.find("2. cleanup").unwrap();
        assert!(done < cleanup);
    }

    #[test]
    fn test_status_reports_interrupted_conversion() {
        let dir = converted_repo(false);
        ds_revert(dir.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("interrupted"));
    }

    #[test]
    fn test_status_does_not_modify_journal() {
        let dir = converted_repo(true);
        let before = fs::read_to_string(journal_path(dir.path())).unwrap();
        ds_revert(dir.path()).arg("status").assert().success();
        assert_eq!(
            fs::read_to_string(journal_path(dir.path())).unwrap(),
            before
        );
    }
}

// =============================================================================
// Revert
// =============================================================================

mod revert {
    use super::*;

    #[test]
    fn test_revert_completed_conversion_requires_force() {
        let dir = converted_repo(true);

        ds_revert(dir.path())
            .arg("revert")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--force"));

        assert!(dir.path().join("new/old/data").exists());
        assert!(journal_path(dir.path()).exists());
    }

    #[test]
    fn test_forced_revert_restores_layout() {
        let dir = converted_repo(true);

        ds_revert(dir.path())
            .args(["revert", "--force"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Revert finished"));

        let root = dir.path();
        assert_eq!(fs::read_to_string(root.join("old/data")).unwrap(), "payload");
        assert!(!root.join("new").exists());
        // Revert leaves cleanup-only artifacts alone.
        assert!(root.join("config.bak").exists());
        assert!(!journal_path(root).exists());
    }

    #[test]
    fn test_revert_interrupted_conversion() {
        let dir = converted_repo(false);

        ds_revert(dir.path()).arg("revert").assert().success();
        assert!(dir.path().join("old/data").exists());
        assert!(!dir.path().join("new").exists());
    }

    #[test]
    fn test_revert_without_journal_is_noop() {
        let dir = TempDir::new().unwrap();
        ds_revert(dir.path())
            .arg("revert")
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing to revert"));
    }

    #[test]
    fn test_revert_reports_blocked_destination() {
        let dir = converted_repo(false);
        fs::create_dir(dir.path().join("old")).unwrap();

        ds_revert(dir.path())
            .arg("revert")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));

        assert!(dir.path().join("new/old/data").exists());
    }

    #[test]
    fn test_corrupt_journal_is_reported() {
        let dir = converted_repo(true);
        let path = journal_path(dir.path());
        let text = fs::read_to_string(&path).unwrap();
        fs::write(&path, text.replacen("cleanup", "clean-up", 1)).unwrap();

        ds_revert(dir.path())
            .args(["revert", "--force"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("corrupt"));
        assert!(dir.path().join("new/old/data").exists());
    }
}

// =============================================================================
// Cleanup
// =============================================================================

mod cleanup {
    use super::*;

    #[test]
    fn test_cleanup_removes_backup_only() {
        let dir = converted_repo(true);

        ds_revert(dir.path())
            .arg("cleanup")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleanup finished"));

        let root = dir.path();
        assert!(!root.join("config.bak").exists());
        assert!(root.join("new/old/data").exists());
        assert!(!journal_path(root).exists());
    }

    #[test]
    fn test_cleanup_refuses_interrupted_conversion() {
        let dir = converted_repo(false);

        ds_revert(dir.path())
            .arg("cleanup")
            .assert()
            .failure()
            .stderr(predicate::str::contains("incomplete conversion"));

        assert!(dir.path().join("config.bak").exists());
    }
}

// =============================================================================
// Configuration
// =============================================================================

mod configuration {
    use super::*;

    #[test]
    fn test_config_file_renames_journal() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("ds-revert.toml"),
            "[journal]\nfile = \"migration.log\"\n",
        )
        .unwrap();
        let staged = dir.path().join("staged");
        fs::create_dir(&staged).unwrap();

        let mut recorder = JournalRecorder::create(&dir.path().join("migration.log")).unwrap();
        recorder.record(&Step::remove(&staged)).unwrap();
        drop(recorder);

        ds_revert(dir.path()).arg("revert").assert().success();
        assert!(!staged.exists());
        assert!(!dir.path().join("migration.log").exists());
    }

    #[test]
    fn test_env_overrides_journal_name() {
        let dir = TempDir::new().unwrap();
        let staged = dir.path().join("staged");
        fs::create_dir(&staged).unwrap();

        let mut recorder = JournalRecorder::create(&dir.path().join("alt.log")).unwrap();
        recorder.record(&Step::remove(&staged)).unwrap();
        drop(recorder);

        ds_revert(dir.path())
            .env("DS_REVERT_JOURNAL", "alt.log")
            .arg("revert")
            .assert()
            .success();
        assert!(!staged.exists());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("ds-revert.toml"),
            "[lock]\nfile = \"../outside.lock\"\n",
        )
        .unwrap();

        ds_revert(dir.path())
            .arg("revert")
            .assert()
            .failure()
            .stderr(predicate::str::contains("plain file name"));
    }
}

//! On-disk encoding of the conversion journal.
//!
//! ```text
//! # ds-revert journal v1
//! 3f9a0c12 {"action":"mkdir","args":["/repo/blocks"]}
//! 81b7e4d0 {"action":"done","args":[]}
//! ```
//!
//! The first line is a version header. Each following line is one step: the
//! first 8 hex digits of the SHA-256 of the JSON text, a space, and the JSON
//! record itself. Records are append-only for the forward phase; rewrites go
//! through a temp file and a rename.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::Step;
use crate::errors::{Result, RevertError};

pub const HEADER: &str = "# ds-revert journal v1";

const CHECKSUM_LEN: usize = 8;

/// Short SHA-256 checksum of a record's JSON text.
pub fn checksum(json: &str) -> String {
    let digest = Sha256::digest(json.as_bytes());
    format!("{:x}", digest)[..CHECKSUM_LEN].to_string()
}

/// Encode one step as a journal line, without the trailing newline.
pub fn encode_record(step: &Step) -> serde_json::Result<String> {
    let json = serde_json::to_string(step)?;
    Ok(format!("{} {}", checksum(&json), json))
}

/// Encode a complete journal, header included.
pub fn encode(steps: &[Step]) -> serde_json::Result<String> {
    let mut out = String::with_capacity(HEADER.len() + 1 + steps.len() * 64);
    out.push_str(HEADER);
    out.push('\n');
    for step in steps {
        out.push_str(&encode_record(step)?);
        out.push('\n');
    }
    Ok(out)
}

/// Decode the raw bytes of the journal at `path`.
pub fn decode_bytes(path: &Path, bytes: &[u8]) -> Result<Vec<Step>> {
    let content = std::str::from_utf8(bytes).map_err(|e| {
        let valid = &bytes[..e.valid_up_to()];
        RevertError::JournalCorrupt {
            path: path.to_path_buf(),
            line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
            reason: "invalid UTF-8".to_string(),
        }
    })?;
    decode(path, content)
}

/// Decode journal text read from `path`. Empty text is an empty journal.
///
/// A final record without its newline was cut off while being appended; if
/// it does not decode it is dropped with a warning instead of failing the
/// whole journal.
pub fn decode(path: &Path, content: &str) -> Result<Vec<Step>> {
    if content.is_empty() {
        return Ok(Vec::new());
    }

    let corrupt = |line: usize, reason: String| RevertError::JournalCorrupt {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut lines = content.lines().enumerate().peekable();
    match lines.next() {
        Some((_, header)) if header == HEADER => {}
        Some((_, header)) => {
            return Err(corrupt(1, format!("unrecognized header '{}'", header)));
        }
        None => return Ok(Vec::new()),
    }

    let torn_tail = !content.ends_with('\n');
    let mut steps = Vec::new();
    while let Some((index, line)) = lines.next() {
        let line_no = index + 1;
        if line.is_empty() {
            continue;
        }

        match decode_record(line) {
            Ok(step) => steps.push(step),
            Err(reason) if torn_tail && lines.peek().is_none() => {
                tracing::warn!(
                    journal = %path.display(),
                    line = line_no,
                    %reason,
                    "dropping unterminated final record"
                );
            }
            Err(reason) => return Err(corrupt(line_no, reason)),
        }
    }

    Ok(steps)
}

fn decode_record(line: &str) -> std::result::Result<Step, String> {
    let (sum, json) = line
        .split_once(' ')
        .ok_or_else(|| "missing checksum".to_string())?;
    if sum.len() != CHECKSUM_LEN || sum != checksum(json) {
        return Err(format!("checksum mismatch ({})", sum));
    }
    serde_json::from_str(json).map_err(|e| format!("invalid record: {}", e))
}

/// Sibling path used while rewriting `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace the journal at `path` with `steps`. Readers see either the old or
/// the new content, never a partial file.
pub fn write_atomic(path: &Path, steps: &[Step]) -> std::io::Result<()> {
    let content = encode(steps)?;
    let tmp = temp_path(path);

    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    fs::rename(&tmp, path)?;
    sync_parent(path);
    Ok(())
}

/// Best-effort fsync of the directory holding `path` so the rename is durable.
#[cfg(unix)]
pub(crate) fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent()
        && let Ok(dir) = fs::File::open(parent)
        && let Err(e) = dir.sync_all()
    {
        tracing::debug!(dir = %parent.display(), error = %e, "directory fsync failed");
    }
}

#[cfg(not(unix))]
pub(crate) fn sync_parent(_path: &Path) {}

//! Append-only posting history
//!
//! The ledger is the source of truth for progress: `posted_count` is simply
//! the number of entries. Persisted representation is a text file with one
//! `<external_id>: <text>` line per entry; blank lines are ignored.
//!
//! Durability contract: `append` writes a single line to a file opened in
//! append mode and syncs it, so a crash mid-run never corrupts prior
//! entries. `clear` is the only whole-file mutation and is reserved for the
//! cycle reset.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{LedgerError, Result};
use crate::types::LedgerEntry;

const SEPARATOR: &str = ": ";

#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all entries, oldest first
    ///
    /// A missing file is empty history, not an error.
    pub fn read_all(&self) -> Result<Vec<LedgerEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(LedgerError::Io)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(parse_line)
            .collect())
    }

    /// Number of entries on record
    pub fn posted_count(&self) -> Result<usize> {
        Ok(self.read_all()?.len())
    }

    /// Append one entry durably
    pub fn append(&self, entry: &LedgerEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(LedgerError::Io)?;
            }
        }

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(LedgerError::Io)?;

        let line = format_line(entry);
        file.write_all(line.as_bytes()).map_err(LedgerError::Io)?;
        file.sync_data().map_err(LedgerError::Io)?;
        Ok(())
    }

    /// Durably truncate the history to empty
    pub fn clear(&self) -> Result<()> {
        let file = File::create(&self.path).map_err(LedgerError::Io)?;
        file.sync_data().map_err(LedgerError::Io)?;
        Ok(())
    }

    /// Duplicate-detection predicate
    ///
    /// True when the candidate text occurs as a substring of any stored
    /// entry's payload portion. Substring (not exact) matching is the
    /// inherited dedup semantics; it can false-positive on content nested
    /// inside a longer entry.
    pub fn contains(&self, text: &str) -> Result<bool> {
        let needle = flatten(text);
        Ok(self
            .read_all()?
            .iter()
            .any(|entry| entry.text.contains(&needle)))
    }
}

/// Ledger lines hold one entry each, so multi-line payloads (block-format
/// queue items) are stored with newlines collapsed to spaces. `contains`
/// flattens its candidate the same way.
fn flatten(text: &str) -> String {
    text.replace(['\r', '\n'], " ").trim().to_string()
}

fn format_line(entry: &LedgerEntry) -> String {
    format!("{}{}{}\n", entry.external_id, SEPARATOR, flatten(&entry.text))
}

/// Parse one non-blank ledger line
///
/// The payload is everything after the first `": "`. A line without the
/// separator (hand-edited history) is kept as payload with an empty id
/// rather than dropped, so it still counts toward progress.
fn parse_line(line: &str) -> LedgerEntry {
    match line.split_once(SEPARATOR) {
        Some((external_id, text)) => LedgerEntry::new(external_id.trim(), text.trim()),
        None => LedgerEntry::new("", line),
    }
}

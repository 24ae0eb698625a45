//! Core types for Dripcast

use serde::{Deserialize, Serialize};

/// External id recorded when the remote rejected the content as already
/// published. Marks "do not retry" without a real id.
pub const DUPLICATE_SENTINEL: &str = "duplicate";

/// One postable item, fixed at its 0-based position in the source queue.
///
/// The text is opaque payload; nothing in the core interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub index: usize,
    pub text: String,
}

/// One line of posting history, oldest first in the ledger file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub external_id: String,
    pub text: String,
}

impl LedgerEntry {
    pub fn new(external_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            text: text.into(),
        }
    }

    /// Entry compensating for a remote-side duplicate rejection
    pub fn duplicate_marker(text: impl Into<String>) -> Self {
        Self::new(DUPLICATE_SENTINEL, text)
    }

    pub fn is_duplicate_marker(&self) -> bool {
        self.external_id == DUPLICATE_SENTINEL
    }
}

/// Terminal state of a successful single run
///
/// Failure terminal states are typed errors, not outcome variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum RunOutcome {
    /// Published and recorded
    #[serde(rename = "posted")]
    Posted { external_id: String },
    /// Candidate already present in history; no publish attempted
    #[serde(rename = "skipped")]
    AlreadyPosted,
    /// Remote already had the content; sentinel recorded, cycle advances
    #[serde(rename = "duplicate")]
    DuplicateCompensated,
}

impl RunOutcome {
    /// One-word classification for scheduler logs
    pub fn status(&self) -> &'static str {
        match self {
            RunOutcome::Posted { .. } => "posted",
            RunOutcome::AlreadyPosted => "skipped",
            RunOutcome::DuplicateCompensated => "duplicate",
        }
    }
}

//! Single-run orchestration
//!
//! One invocation walks select → dedup check → publish → reconcile → report
//! and exits. Progress is committed by the single ledger append (plus the
//! wrap's clear); rate-limited and transient outcomes write nothing, so the
//! next invocation re-selects the identical candidate.
//!
//! Precondition: at most one invocation runs at a time against a given
//! ledger. There is no locking or versioning; two concurrent runs reading
//! the same history will select and publish the same content twice. The
//! intended deployment is a scheduler that serializes runs.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::RetryConfig;
use crate::error::{DripcastError, LedgerError, PublishError, Result};
use crate::ledger::Ledger;
use crate::publisher::{publish_with_retry, Publisher};
use crate::queue::ContentQueue;
use crate::selector::{CyclePolicy, Pick};
use crate::types::{ContentItem, LedgerEntry, RunOutcome};

/// Terminal report of one completed invocation
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub outcome: RunOutcome,
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<u8>,
    pub posted_count: usize,
    pub queue_len: usize,
    pub remaining: usize,
    pub cycle_reset: bool,
    pub text: String,
}

/// What a dry run would do, with no publish and no ledger mutation
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub status: String,
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<u8>,
    pub posted_count: usize,
    pub queue_len: usize,
    pub would_reset: bool,
    pub text: String,
}

pub struct Runner<'a> {
    queue: &'a ContentQueue,
    ledger: &'a Ledger,
    publisher: &'a dyn Publisher,
    policy: Box<dyn CyclePolicy>,
    retry: RetryConfig,
}

impl<'a> Runner<'a> {
    pub fn new(
        queue: &'a ContentQueue,
        ledger: &'a Ledger,
        publisher: &'a dyn Publisher,
        policy: Box<dyn CyclePolicy>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            queue,
            ledger,
            publisher,
            policy,
            retry,
        }
    }

    /// Entries on record, treating an unreadable ledger as empty history
    fn history_len(&self) -> usize {
        match self.ledger.read_all() {
            Ok(entries) => entries.len(),
            Err(e) => {
                warn!(error = %e, "could not read ledger, treating as empty history");
                0
            }
        }
    }

    fn select(&self, posted_count: usize) -> Result<(Pick, &'a ContentItem)> {
        let pick = self.policy.pick(self.queue.len(), posted_count);
        let item = self.queue.get(pick.index).ok_or_else(|| {
            DripcastError::InvalidInput(format!(
                "selected index {} outside queue of {}",
                pick.index,
                self.queue.len()
            ))
        })?;
        Ok((pick, item))
    }

    /// Execute one full invocation
    pub async fn run(&self) -> Result<RunReport> {
        let posted_before = self.history_len();
        let (pick, item) = self.select(posted_before)?;
        let (day, slot) = split_coordinate(&pick);

        // The wrap's clear happens before any publish attempt; if it fails
        // we abort here, with no remote side effect to lose.
        let effective_count = if pick.wraps {
            info!(posted = posted_before, "queue cycle complete, clearing history");
            self.ledger.clear()?;
            0
        } else {
            posted_before
        };

        let already = match self.ledger.contains(&item.text) {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "duplicate check failed, assuming not posted");
                false
            }
        };
        if already {
            info!(index = item.index, "content already in history, skipping");
            return Ok(self.report(
                RunOutcome::AlreadyPosted,
                &pick,
                item,
                effective_count,
            ));
        }

        match publish_with_retry(self.publisher, &item.text, &self.retry).await {
            Ok(external_id) => {
                let entry = LedgerEntry::new(external_id.clone(), item.text.clone());
                if let Err(e) = self.ledger.append(&entry) {
                    error!(
                        external_id = %external_id,
                        error = %e,
                        "publish succeeded but history write failed; next run may double-post"
                    );
                    return Err(LedgerError::CommitFailed {
                        external_id,
                        source: into_io(e),
                    }
                    .into());
                }
                info!(index = item.index, external_id = %external_id, day, slot, "posted");
                Ok(self.report(
                    RunOutcome::Posted { external_id },
                    &pick,
                    item,
                    effective_count + 1,
                ))
            }
            Err(DripcastError::Publish(PublishError::DuplicateRejected(reason))) => {
                // The remote already has this content, likely from a run
                // whose ledger write never landed. Record the sentinel so
                // the sequence advances instead of retrying forever.
                info!(index = item.index, reason = %reason, "remote duplicate, recording marker");
                let marker = LedgerEntry::duplicate_marker(item.text.clone());
                if let Err(e) = self.ledger.append(&marker) {
                    warn!(error = %e, "could not record duplicate marker");
                }
                Ok(self.report(
                    RunOutcome::DuplicateCompensated,
                    &pick,
                    item,
                    effective_count + 1,
                ))
            }
            Err(e) => {
                // Rate-limited and transient outcomes leave the ledger
                // untouched: the same candidate is retried next invocation.
                Err(e)
            }
        }
    }

    /// Selection and dedup check only: no publish, no ledger mutation
    /// (not even the wrap's clear)
    pub fn preview(&self) -> Result<Preview> {
        let posted_count = self.history_len();
        let (pick, item) = self.select(posted_count)?;
        let (day, slot) = split_coordinate(&pick);

        // A wrap would clear the history first, so dedup is checked
        // against the post-clear (empty) state.
        let already = if pick.wraps {
            false
        } else {
            self.ledger.contains(&item.text).unwrap_or(false)
        };

        Ok(Preview {
            status: if already { "skipped" } else { "would-post" }.to_string(),
            index: pick.index,
            day,
            slot,
            posted_count,
            queue_len: self.queue.len(),
            would_reset: pick.wraps,
            text: item.text.clone(),
        })
    }

    fn report(
        &self,
        outcome: RunOutcome,
        pick: &Pick,
        item: &ContentItem,
        posted_count: usize,
    ) -> RunReport {
        let (day, slot) = split_coordinate(pick);
        let queue_len = self.queue.len();
        RunReport {
            outcome,
            index: pick.index,
            day,
            slot,
            posted_count,
            queue_len,
            remaining: queue_len.saturating_sub(posted_count),
            cycle_reset: pick.wraps,
            text: item.text.clone(),
        }
    }
}

fn split_coordinate(pick: &Pick) -> (Option<u32>, Option<u8>) {
    match pick.coordinate {
        Some(c) => (Some(c.day), Some(c.slot)),
        None => (None, None),
    }
}

fn into_io(error: DripcastError) -> std::io::Error {
    match error {
        DripcastError::Ledger(LedgerError::Io(io)) => io,
        other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
    }
}

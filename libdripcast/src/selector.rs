//! Next-item selection
//!
//! Both selection modes are policy strategies behind one trait, sharing the
//! cycle-reset contract: when the derived index runs past the end of the
//! queue, the pick is flagged `wraps` and the runner clears the ledger
//! before using it. Policies are pure functions of
//! `(queue_len, posted_count)` plus, for the slot policy, the hour the
//! caller sampled from the slot clock; they perform no I/O of their own.

use crate::slot::{slot_for_hour, SlotCoordinate};

/// A policy's decision for this invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pick {
    /// Queue index to post, always within `[0, queue_len)`
    pub index: usize,
    /// Logical coordinate, slot mode only
    pub coordinate: Option<SlotCoordinate>,
    /// The cycle is exhausted; history must be cleared before this pick
    /// is committed
    pub wraps: bool,
}

pub trait CyclePolicy: Send + Sync {
    /// Derive the next pick from queue length and entries on record
    ///
    /// `queue_len` must be nonzero (the queue loader guarantees it).
    fn pick(&self, queue_len: usize, posted_count: usize) -> Pick;

    fn name(&self) -> &'static str;
}

/// Post strictly in queue order: next index is simply the entry count
pub struct SequentialPolicy;

impl CyclePolicy for SequentialPolicy {
    fn pick(&self, queue_len: usize, posted_count: usize) -> Pick {
        let mut index = posted_count;
        let mut wraps = false;
        if index >= queue_len {
            wraps = true;
            index = 0;
        }
        Pick {
            index,
            coordinate: None,
            wraps,
        }
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

/// Two posts per logical day, chosen by time-of-day window
///
/// The day is inferred from `posted_count / 2`, not a stored date, so the
/// schedule re-derives itself from the ledger alone. After exhaustion the
/// day resets to 1 while the slot keeps its time-derived value, so an
/// evening reset replays the evening side of day one.
pub struct SlotPolicy {
    hour: u32,
}

impl SlotPolicy {
    /// Policy for the given hour-of-day on the slot clock
    pub fn at_hour(hour: u32) -> Self {
        Self { hour }
    }
}

impl CyclePolicy for SlotPolicy {
    fn pick(&self, queue_len: usize, posted_count: usize) -> Pick {
        let slot = slot_for_hour(self.hour);
        let mut day = (posted_count / 2) as u32 + 1;
        let mut coordinate = SlotCoordinate { day, slot };
        let mut wraps = false;

        if coordinate.item_index() >= queue_len {
            wraps = true;
            day = 1;
            coordinate = SlotCoordinate { day, slot };
        }

        // The reset branch can still land one past the end (single-item
        // queue, evening slot); never emit an index outside the queue.
        let index = coordinate.item_index().min(queue_len - 1);

        Pick {
            index,
            coordinate: Some(coordinate),
            wraps,
        }
    }

    fn name(&self) -> &'static str {
        "slot"
    }
}

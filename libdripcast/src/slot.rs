//! Slot clock for time-aware selection
//!
//! Maps wall-clock time to one of two daily publishing windows. The clock
//! runs on an explicit fixed UTC offset (default +5:30), never the host's
//! local zone, so slot boundaries are reproducible across deployments.

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DripcastError, Result};

/// Minutes east of UTC for the default slot clock (UTC+5:30)
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

/// Morning window is everything before this hour; evening from it onward
pub const SLOT_BOUNDARY_HOUR: u32 = 12;

#[derive(Debug, Clone, Copy)]
pub struct SlotClock {
    offset: FixedOffset,
}

impl SlotClock {
    /// Clock on the default UTC+5:30 offset
    pub fn new() -> Self {
        Self {
            offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60)
                .expect("default offset is in range"),
        }
    }

    /// Clock on an arbitrary fixed offset, minutes east of UTC
    pub fn from_offset_minutes(minutes: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
            DripcastError::InvalidInput(format!("UTC offset out of range: {} minutes", minutes))
        })?;
        Ok(Self { offset })
    }

    /// Hour-of-day (0..=23) right now on this clock
    pub fn current_hour(&self) -> u32 {
        self.hour_at(Utc::now())
    }

    /// Hour-of-day at a given instant on this clock
    pub fn hour_at(&self, instant: DateTime<Utc>) -> u32 {
        instant.with_timezone(&self.offset).hour()
    }
}

impl Default for SlotClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Which of the two daily windows an hour falls in
pub fn slot_for_hour(hour: u32) -> u8 {
    if hour < SLOT_BOUNDARY_HOUR {
        1
    } else {
        2
    }
}

/// Logical (day, slot) publishing coordinate
///
/// `day` starts at 1 and is inferred from posted_count, not the calendar,
/// so progress is self-correcting from the ledger alone. Missed or doubled
/// invocations drift the coordinate from real days; that only shifts which
/// content plays when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCoordinate {
    pub day: u32,
    pub slot: u8,
}

impl SlotCoordinate {
    /// Position in the queue this coordinate maps to
    pub fn item_index(&self) -> usize {
        ((self.day - 1) * 2 + (u32::from(self.slot) - 1)) as usize
    }
}

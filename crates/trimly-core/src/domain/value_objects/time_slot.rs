//! Half-open time interval within a single day.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

/// `[start, end)` on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    /// Builds the slot starting at `start` lasting `minutes`.
    ///
    /// Returns `None` when the slot would cross midnight or is empty.
    #[must_use]
    pub fn starting_at(start: NaiveTime, minutes: i64) -> Option<Self> {
        if minutes <= 0 {
            return None;
        }
        let (end, wrapped) = start.overflowing_add_signed(Duration::minutes(minutes));
        // Ending exactly at midnight wraps to 00:00, which is never a valid end
        if wrapped != 0 || end <= start {
            return None;
        }
        Some(Self { start, end })
    }

    /// Length in minutes.
    #[must_use]
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Touching intervals do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Checks that this slot lies within `[open, close]`.
    #[must_use]
    pub fn within(&self, open: NaiveTime, close: NaiveTime) -> bool {
        self.start >= open && self.end <= close
    }
}

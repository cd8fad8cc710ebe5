use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cadence::ResetCadence;

/// The allocator-owned half of the persisted record: the most recently
/// issued sequence number and the date the counter last started over.
///
/// Both fields only ever move forward as a side effect of allocation. They
/// are never exposed for editing; administrators reconfigure the settings in
/// [`IdentifierConfig`] instead.
///
/// [`IdentifierConfig`]: crate::IdentifierConfig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    /// The sequence number handed out by the most recent allocation within
    /// the current cadence window. Zero means no allocation has happened
    /// since the window began.
    pub last_sequence: u64,
    /// The date the sequence was last reset, or the date the record was
    /// created.
    pub last_reset_on: NaiveDate,
}

impl CounterState {
    /// A fresh counter, as seeded when the record is first created.
    pub fn new(created_on: NaiveDate) -> Self {
        Self {
            last_sequence: 0,
            last_reset_on: created_on,
        }
    }

    /// Advances the counter for an allocation dated `today`, resetting first
    /// when `today` falls in a new cadence window. Returns the sequence
    /// number the allocation should carry.
    ///
    /// This is the pure core of the allocation algorithm; callers are
    /// responsible for running it under exclusive access to the record and
    /// persisting the mutation before releasing that access.
    pub fn advance(&mut self, cadence: ResetCadence, today: NaiveDate) -> u64 {
        if cadence.window_changed(self.last_reset_on, today) {
            self.last_sequence = 0;
            self.last_reset_on = today;
        }
        self.last_sequence += 1;
        self.last_sequence
    }
}

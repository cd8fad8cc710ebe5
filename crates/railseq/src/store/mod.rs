mod memory;

pub use memory::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::IdentifierConfig;
use crate::counter::CounterState;
use crate::error::Result;

/// The singleton persisted record: editable settings plus the
/// allocator-owned counter.
///
/// A store guarantees at most one such record exists (fixed key, unique
/// constraint, or a single in-memory slot); nothing in this crate relies on
/// process-global state for that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub config: IdentifierConfig,
    pub counter: CounterState,
}

impl ConfigRecord {
    /// The record as first created: default settings, zero counter, reset
    /// date stamped with the creation date.
    pub fn new(created_on: NaiveDate) -> Self {
        Self {
            config: IdentifierConfig::default(),
            counter: CounterState::new(created_on),
        }
    }
}

/// Durable storage for the singleton [`ConfigRecord`].
///
/// This is the transactional seam the allocation guarantees rest on. An
/// implementation must:
///
/// - run `f` with **exclusive** access to the record slot: no other
///   `transact` call may read or write the slot until this one returns;
/// - persist any mutation durably **before** releasing that access;
/// - bound the wait for exclusive access, failing with
///   [`Error::LockTimeout`] rather than blocking indefinitely;
/// - fail with [`Error::StoreUnavailable`] when the backing storage cannot
///   be reached, without applying any mutation.
///
/// The slot starts out empty ([`None`]); callers seed it on first use so
/// the record's creation date comes from the caller's clock.
///
/// [`Error::LockTimeout`]: crate::Error::LockTimeout
/// [`Error::StoreUnavailable`]: crate::Error::StoreUnavailable
pub trait ConfigStore {
    /// Runs `f` against the record slot under the contract above and
    /// returns its result.
    fn transact<R>(&self, f: impl FnOnce(&mut Option<ConfigRecord>) -> R) -> Result<R>;
}

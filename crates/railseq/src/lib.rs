//! # railseq
//!
//! Sequential, human-readable identifiers for railway failure records, with
//! periodic reset and collision-free allocation under concurrent writers.
//!
//! ## Identifier Format
//!
//! Every failure record is stamped with one identifier at creation time,
//! derived from a single persisted configuration record:
//!
//! - Yearly cadence: `RF-2025-0042`
//! - Monthly cadence: `RF-2025-06-0042`
//! - No reset: `RF-0042`
//!
//! The numeric suffix increases by one per allocation and resets to 1 on the
//! first allocation of a new cadence window. Sequences wider than the
//! configured padding widen the string; they are never truncated.
//!
//! ## Allocation contract
//!
//! [`IdentifierAllocator`] performs the read-check-reset-increment-persist
//! cycle as one exclusive unit against a [`ConfigStore`], so no two calls can
//! ever return the same string, no matter how many writers race. Gaps appear
//! only when a caller discards an issued identifier (e.g. its record save
//! fails); duplicates never appear.
//!
//! ```
//! use chrono::NaiveDate;
//! use railseq::{Clock, IdentifierAllocator, MemoryStore};
//!
//! struct FixedClock(NaiveDate);
//! impl Clock for FixedClock {
//!     fn today(&self) -> NaiveDate {
//!         self.0
//!     }
//! }
//!
//! let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
//! let allocator = IdentifierAllocator::new(MemoryStore::new(), clock);
//!
//! assert_eq!(allocator.allocate_next()?.as_str(), "RF-2025-0001");
//! assert_eq!(allocator.allocate_next()?.as_str(), "RF-2025-0002");
//! # Ok::<(), railseq::Error>(())
//! ```
//!
//! ## Stores
//!
//! [`MemoryStore`] serializes writers with a bounded-wait mutex and is the
//! reference implementation of the store contract. The `railseq-pg` crate
//! provides the same semantics on PostgreSQL via row-level locking.

mod admin;
mod allocator;
mod cadence;
mod clock;
mod config;
mod counter;
mod error;
mod identifier;
mod record;
mod store;

pub use crate::admin::*;
pub use crate::allocator::*;
pub use crate::cadence::*;
pub use crate::clock::*;
pub use crate::config::*;
pub use crate::counter::*;
pub use crate::error::*;
pub use crate::identifier::*;
pub use crate::record::*;
pub use crate::store::*;

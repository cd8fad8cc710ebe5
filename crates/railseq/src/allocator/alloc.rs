use tracing::{debug, instrument};

use crate::allocator::IdentifierSource;
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::identifier::Identifier;
use crate::store::{ConfigRecord, ConfigStore};

/// Issues sequential failure identifiers against a [`ConfigStore`].
///
/// Each allocation runs the full read-check-reset-increment-persist cycle
/// inside one `transact` call, so the store's exclusive access is what makes
/// concurrent allocations collision-free: two racing callers can never both
/// observe the same `last_sequence`.
///
/// The allocation date is read *inside* the critical section; a caller that
/// blocked across midnight on New Year's Eve therefore resets the window
/// rather than extending the old one.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use railseq::{Clock, IdentifierAllocator, MemoryStore};
///
/// struct FixedClock(NaiveDate);
/// impl Clock for FixedClock {
///     fn today(&self) -> NaiveDate {
///         self.0
///     }
/// }
///
/// let clock = FixedClock(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
/// let allocator = IdentifierAllocator::new(MemoryStore::new(), clock);
/// assert_eq!(allocator.allocate_next()?.as_str(), "RF-2025-0001");
/// # Ok::<(), railseq::Error>(())
/// ```
pub struct IdentifierAllocator<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S> IdentifierAllocator<S, SystemClock>
where
    S: ConfigStore,
{
    /// An allocator on the host's wall clock.
    pub fn with_system_clock(store: S) -> Self {
        Self::new(store, SystemClock)
    }
}

impl<S, C> IdentifierAllocator<S, C>
where
    S: ConfigStore,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Allocates the next identifier.
    ///
    /// Lazily seeds the configuration record with defaults on first use.
    /// On success the consumed sequence number is already persisted: if the
    /// caller's own record save fails afterwards, the number is gone for
    /// good and the window shows a gap. Gaps are accepted; duplicates are
    /// not.
    ///
    /// # Errors
    ///
    /// See [`IdentifierSource::allocate_next`]. On any error no state was
    /// mutated and no sequence number was consumed.
    #[instrument(level = "debug", skip(self))]
    pub fn allocate_next(&self) -> Result<Identifier> {
        let (identifier, reset) = self.store.transact(|slot| {
            let today = self.clock.today();
            let record = slot.get_or_insert_with(|| ConfigRecord::new(today));
            let reset = record
                .config
                .reset_cadence
                .window_changed(record.counter.last_reset_on, today);
            let sequence = record.counter.advance(record.config.reset_cadence, today);
            (Identifier::compose(&record.config, today, sequence), reset)
        })?;

        if reset {
            debug!(identifier = %identifier, "sequence window reset");
        }
        debug!(identifier = %identifier, "allocated failure identifier");
        Ok(identifier)
    }
}

impl<S, C> IdentifierSource for IdentifierAllocator<S, C>
where
    S: ConfigStore,
    C: Clock,
{
    fn allocate_next(&self) -> Result<Identifier> {
        self.allocate_next()
    }
}

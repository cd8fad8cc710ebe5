use tracing::{debug, instrument};

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigPatch, IdentifierConfig};
use crate::error::Result;
use crate::store::{ConfigRecord, ConfigStore};

/// The administration surface over the identifier settings.
///
/// Exposes read and partial-write access to the three editable fields
/// (`prefix`, `padding_width`, `reset_cadence`) and nothing else: the
/// counter fields never cross this boundary in either direction, and the
/// singleton record can be reconfigured but never deleted.
///
/// Reads behave like the allocator's first use: a missing record is seeded
/// with defaults, stamped with today's date.
pub struct ConfigAdmin<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S> ConfigAdmin<S, SystemClock>
where
    S: ConfigStore,
{
    pub fn with_system_clock(store: S) -> Self {
        Self::new(store, SystemClock)
    }
}

impl<S, C> ConfigAdmin<S, C>
where
    S: ConfigStore,
    C: Clock,
{
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Returns the current settings, creating the record with defaults if
    /// it does not exist yet.
    pub fn settings(&self) -> Result<IdentifierConfig> {
        self.store.transact(|slot| {
            slot.get_or_insert_with(|| ConfigRecord::new(self.clock.today()))
                .config
                .clone()
        })
    }

    /// Validates and applies a partial update, returning the settings as
    /// they now stand.
    ///
    /// The patch takes effect on the next allocation; identifiers already
    /// issued are untouched, as are the allocator-owned counter fields.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] when a provided field violates the
    /// write-time rules; nothing is written in that case.
    ///
    /// [`Error::InvalidConfig`]: crate::Error::InvalidConfig
    #[instrument(level = "debug", skip(self, patch))]
    pub fn update(&self, patch: &ConfigPatch) -> Result<IdentifierConfig> {
        patch.validate()?;
        let config = self.store.transact(|slot| {
            let record = slot.get_or_insert_with(|| ConfigRecord::new(self.clock.today()));
            patch.apply_to(&mut record.config);
            record.config.clone()
        })?;
        debug!(
            prefix = %config.prefix,
            padding_width = config.padding_width,
            cadence = %config.reset_cadence,
            "identifier settings updated"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    use crate::{ConfigError, CounterState, Error, MemoryStore, ResetCadence};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[derive(Clone, Copy)]
    struct FixedClock(NaiveDate);

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            self.0
        }
    }

    #[test]
    fn settings_read_seeds_defaults() {
        let store = MemoryStore::new();
        let admin = ConfigAdmin::new(store.clone(), FixedClock(date(2025, 4, 2)));

        assert_eq!(admin.settings().unwrap(), IdentifierConfig::default());

        let counter = store
            .transact(|slot| slot.as_ref().unwrap().counter)
            .unwrap();
        assert_eq!(counter, CounterState::new(date(2025, 4, 2)));
    }

    #[test]
    fn update_touches_only_editable_fields() {
        let store = MemoryStore::new();
        store
            .transact(|slot| {
                let mut record = ConfigRecord::new(date(2025, 1, 1));
                record.counter.last_sequence = 99;
                *slot = Some(record);
            })
            .unwrap();

        let admin = ConfigAdmin::new(store.clone(), FixedClock(date(2025, 4, 2)));
        let patch = ConfigPatch {
            prefix: Some("TRK".to_string()),
            padding_width: Some(5),
            reset_cadence: Some(ResetCadence::Never),
        };
        let config = admin.update(&patch).unwrap();
        assert_eq!(config.prefix, "TRK");
        assert_eq!(config.padding_width, 5);
        assert_eq!(config.reset_cadence, ResetCadence::Never);

        // Counter fields are allocator-owned and survive the update intact.
        let counter = store
            .transact(|slot| slot.as_ref().unwrap().counter)
            .unwrap();
        assert_eq!(counter.last_sequence, 99);
        assert_eq!(counter.last_reset_on, date(2025, 1, 1));
    }

    #[test]
    fn invalid_patch_is_rejected_before_any_write() {
        let store = MemoryStore::new();
        let admin = ConfigAdmin::new(store.clone(), FixedClock(date(2025, 4, 2)));
        let patch = ConfigPatch {
            prefix: Some(String::new()),
            ..ConfigPatch::default()
        };

        let err = admin.update(&patch).unwrap_err();
        assert_eq!(err, Error::InvalidConfig(ConfigError::EmptyPrefix));

        // The rejected write did not even seed the record.
        assert!(store.transact(|slot| slot.is_none()).unwrap());
    }
}

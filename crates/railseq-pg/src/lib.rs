//! PostgreSQL persistence for `railseq`.
//!
//! The singleton configuration record lives in one table row with a fixed
//! primary key (`id = 1`, enforced by a CHECK constraint), so "at most one
//! record exists" is a database guarantee rather than application
//! convention. Every allocation runs in a transaction that takes a
//! row-level lock (`SELECT … FOR UPDATE`) on that row, which serializes the
//! read-check-reset-increment-persist cycle across every connection and
//! process. The wait for the lock is bounded with `SET LOCAL lock_timeout`;
//! exceeding it surfaces as the retryable [`Error::LockTimeout`].
//!
//! The cycle itself is the same pure logic the in-memory allocator uses
//! ([`CounterState::advance`] and [`Identifier::compose`]); this crate only
//! supplies the durable, lock-mediated record access. On any error the
//! transaction rolls back, so a failed allocation never consumes a sequence
//! number.
//!
//! [`Error::LockTimeout`]: railseq::Error::LockTimeout

use std::time::Duration;

use chrono::NaiveDate;
use railseq::{
    Clock, ConfigPatch, ConfigRecord, CounterState, Error, Identifier, IdentifierConfig,
    ResetCadence, Result, SystemClock,
};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, instrument};

/// Bounded wait for the row lock before failing with `LockTimeout`.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Postgres error code for `lock_not_available`, raised when
/// `lock_timeout` expires.
const PG_LOCK_NOT_AVAILABLE: &str = "55P03";

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS identifier_config (
    id            SMALLINT PRIMARY KEY CHECK (id = 1),
    prefix        TEXT NOT NULL,
    padding_width INTEGER NOT NULL,
    reset_cadence TEXT NOT NULL,
    last_sequence BIGINT NOT NULL,
    last_reset_on DATE NOT NULL
)
"#;

const SELECT_FOR_UPDATE: &str = r#"
SELECT prefix, padding_width, reset_cadence, last_sequence, last_reset_on
FROM identifier_config
WHERE id = 1
FOR UPDATE
"#;

const INSERT_SEED: &str = r#"
INSERT INTO identifier_config (id, prefix, padding_width, reset_cadence, last_sequence, last_reset_on)
VALUES (1, $1, $2, $3, $4, $5)
ON CONFLICT (id) DO NOTHING
"#;

const UPDATE_COUNTER: &str = r#"
UPDATE identifier_config
SET last_sequence = $1, last_reset_on = $2
WHERE id = 1
"#;

const UPDATE_SETTINGS: &str = r#"
UPDATE identifier_config
SET prefix = $1, padding_width = $2, reset_cadence = $3
WHERE id = 1
"#;

/// Creates the backing table if it does not exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(CREATE_TABLE)
        .execute(pool)
        .await
        .map_err(store_error)?;
    Ok(())
}

/// Issues sequential failure identifiers against a Postgres-backed record.
///
/// The async counterpart of `railseq::IdentifierAllocator`: same
/// guarantees, with the exclusive access provided by a row-level lock
/// instead of an in-process mutex.
#[derive(Clone)]
pub struct PgIdentifierAllocator<C = SystemClock> {
    pool: PgPool,
    clock: C,
    lock_timeout: Duration,
}

impl PgIdentifierAllocator<SystemClock> {
    /// An allocator on the host's wall clock.
    pub fn new(pool: PgPool) -> Self {
        Self::with_clock(pool, SystemClock)
    }
}

impl<C> PgIdentifierAllocator<C>
where
    C: Clock,
{
    pub fn with_clock(pool: PgPool, clock: C) -> Self {
        Self {
            pool,
            clock,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Overrides the bounded wait for the row lock.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Allocates the next identifier, lazily seeding the record with
    /// defaults on first use.
    ///
    /// # Errors
    ///
    /// - [`Error::LockTimeout`] when the row lock could not be taken within
    ///   the bounded wait; retryable.
    /// - [`Error::StoreUnavailable`] for any other database failure. The
    ///   transaction is rolled back and no sequence number is consumed.
    #[instrument(level = "debug", skip(self))]
    pub async fn allocate_next(&self) -> Result<Identifier> {
        let mut tx = begin_locked(&self.pool, self.lock_timeout).await?;
        let today = self.clock.today();
        let mut record = lock_or_seed(&mut tx, today).await?;

        let reset = record
            .config
            .reset_cadence
            .window_changed(record.counter.last_reset_on, today);
        let sequence = record.counter.advance(record.config.reset_cadence, today);

        sqlx::query(UPDATE_COUNTER)
            .bind(record.counter.last_sequence as i64)
            .bind(record.counter.last_reset_on)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        tx.commit().await.map_err(store_error)?;

        let identifier = Identifier::compose(&record.config, today, sequence);
        if reset {
            debug!(identifier = %identifier, "sequence window reset");
        }
        debug!(identifier = %identifier, "allocated failure identifier");
        Ok(identifier)
    }
}

/// The administration surface over the Postgres-backed settings.
///
/// Same boundary as `railseq::ConfigAdmin`: the three editable fields go
/// in and out, the counter columns are never read back to callers and never
/// written here.
#[derive(Clone)]
pub struct PgConfigAdmin<C = SystemClock> {
    pool: PgPool,
    clock: C,
    lock_timeout: Duration,
}

impl PgConfigAdmin<SystemClock> {
    pub fn new(pool: PgPool) -> Self {
        Self::with_clock(pool, SystemClock)
    }
}

impl<C> PgConfigAdmin<C>
where
    C: Clock,
{
    pub fn with_clock(pool: PgPool, clock: C) -> Self {
        Self {
            pool,
            clock,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Returns the current settings, creating the record with defaults if
    /// it does not exist yet.
    pub async fn settings(&self) -> Result<IdentifierConfig> {
        let mut tx = begin_locked(&self.pool, self.lock_timeout).await?;
        let record = lock_or_seed(&mut tx, self.clock.today()).await?;
        tx.commit().await.map_err(store_error)?;
        Ok(record.config)
    }

    /// Validates and applies a partial update, returning the settings as
    /// they now stand.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] when a provided field violates the
    /// write-time rules; the database is not touched in that case.
    ///
    /// [`Error::InvalidConfig`]: railseq::Error::InvalidConfig
    #[instrument(level = "debug", skip(self, patch))]
    pub async fn update(&self, patch: &ConfigPatch) -> Result<IdentifierConfig> {
        patch.validate()?;

        let mut tx = begin_locked(&self.pool, self.lock_timeout).await?;
        let mut record = lock_or_seed(&mut tx, self.clock.today()).await?;
        patch.apply_to(&mut record.config);

        sqlx::query(UPDATE_SETTINGS)
            .bind(&record.config.prefix)
            .bind(record.config.padding_width as i32)
            .bind(record.config.reset_cadence.as_str())
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        tx.commit().await.map_err(store_error)?;

        debug!(
            prefix = %record.config.prefix,
            padding_width = record.config.padding_width,
            cadence = %record.config.reset_cadence,
            "identifier settings updated"
        );
        Ok(record.config)
    }
}

/// Opens a transaction with the bounded lock wait applied.
async fn begin_locked(
    pool: &PgPool,
    lock_timeout: Duration,
) -> Result<Transaction<'static, Postgres>> {
    let mut tx = pool.begin().await.map_err(store_error)?;
    let set_timeout = format!("SET LOCAL lock_timeout = '{}ms'", lock_timeout.as_millis());
    sqlx::query(&set_timeout)
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;
    Ok(tx)
}

/// Takes the row lock on the singleton record, inserting the seed row first
/// if none exists. The `ON CONFLICT DO NOTHING` + re-select handles a
/// concurrent first use: whichever writer loses the insert race locks the
/// winner's row instead.
async fn lock_or_seed(
    tx: &mut Transaction<'_, Postgres>,
    today: NaiveDate,
) -> Result<ConfigRecord> {
    if let Some(row) = sqlx::query(SELECT_FOR_UPDATE)
        .fetch_optional(&mut **tx)
        .await
        .map_err(store_error)?
    {
        return record_from_row(&row);
    }

    let seed = ConfigRecord::new(today);
    sqlx::query(INSERT_SEED)
        .bind(&seed.config.prefix)
        .bind(seed.config.padding_width as i32)
        .bind(seed.config.reset_cadence.as_str())
        .bind(seed.counter.last_sequence as i64)
        .bind(seed.counter.last_reset_on)
        .execute(&mut **tx)
        .await
        .map_err(store_error)?;

    let row = sqlx::query(SELECT_FOR_UPDATE)
        .fetch_one(&mut **tx)
        .await
        .map_err(store_error)?;
    record_from_row(&row)
}

fn record_from_row(row: &PgRow) -> Result<ConfigRecord> {
    let prefix: String = row.try_get("prefix").map_err(store_error)?;
    let padding_width: i32 = row.try_get("padding_width").map_err(store_error)?;
    let cadence_text: String = row.try_get("reset_cadence").map_err(store_error)?;
    let last_sequence: i64 = row.try_get("last_sequence").map_err(store_error)?;
    let last_reset_on: NaiveDate = row.try_get("last_reset_on").map_err(store_error)?;

    let reset_cadence: ResetCadence = cadence_text
        .parse()
        .map_err(|e| Error::StoreUnavailable(format!("corrupt identifier record: {e}")))?;

    Ok(ConfigRecord {
        config: IdentifierConfig {
            prefix,
            padding_width: padding_width as u32,
            reset_cadence,
        },
        counter: CounterState {
            last_sequence: last_sequence as u64,
            last_reset_on,
        },
    })
}

fn store_error(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(PG_LOCK_NOT_AVAILABLE) {
            return Error::LockTimeout;
        }
    }
    Error::StoreUnavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use chrono::Datelike;

    #[derive(Clone, Copy)]
    struct FixedClock(NaiveDate);

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            self.0
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn fresh_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL")
            .expect("set DATABASE_URL to run the postgres integration tests");
        let pool = PgPool::connect(&url).await.expect("connect to postgres");
        ensure_schema(&pool).await.unwrap();
        sqlx::query("TRUNCATE identifier_config")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    #[ignore = "requires a running postgres; set DATABASE_URL"]
    async fn fresh_record_is_seeded_with_defaults() {
        let pool = fresh_pool().await;
        let allocator =
            PgIdentifierAllocator::with_clock(pool.clone(), FixedClock(date(2025, 6, 15)));

        assert_eq!(allocator.allocate_next().await.unwrap().as_str(), "RF-2025-0001");
        assert_eq!(allocator.allocate_next().await.unwrap().as_str(), "RF-2025-0002");
        assert_eq!(allocator.allocate_next().await.unwrap().as_str(), "RF-2025-0003");
    }

    #[tokio::test]
    #[ignore = "requires a running postgres; set DATABASE_URL"]
    async fn yearly_boundary_resets_the_sequence() {
        let pool = fresh_pool().await;

        let before = PgIdentifierAllocator::with_clock(pool.clone(), FixedClock(date(2024, 12, 31)));
        for _ in 0..7 {
            before.allocate_next().await.unwrap();
        }

        let after = PgIdentifierAllocator::with_clock(pool.clone(), FixedClock(date(2025, 1, 1)));
        assert_eq!(after.allocate_next().await.unwrap().as_str(), "RF-2025-0001");
    }

    #[tokio::test]
    #[ignore = "requires a running postgres; set DATABASE_URL"]
    async fn racing_allocations_never_collide() {
        const TASKS: usize = 8;
        const IDS_PER_TASK: usize = 25;

        let pool = fresh_pool().await;
        let allocator = PgIdentifierAllocator::new(pool.clone());

        let mut handles = Vec::with_capacity(TASKS);
        for _ in 0..TASKS {
            let allocator = allocator.clone();
            handles.push(tokio::spawn(async move {
                let mut ids = Vec::with_capacity(IDS_PER_TASK);
                for _ in 0..IDS_PER_TASK {
                    ids.push(allocator.allocate_next().await.unwrap().into_string());
                }
                ids
            }));
        }

        let mut seen = HashSet::with_capacity(TASKS * IDS_PER_TASK);
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), TASKS * IDS_PER_TASK);
    }

    #[tokio::test]
    #[ignore = "requires a running postgres; set DATABASE_URL"]
    async fn settings_update_shapes_the_next_allocation() {
        let pool = fresh_pool().await;
        let clock = FixedClock(date(2025, 6, 15));
        let allocator = PgIdentifierAllocator::with_clock(pool.clone(), clock);
        let admin = PgConfigAdmin::with_clock(pool.clone(), clock);

        assert_eq!(allocator.allocate_next().await.unwrap().as_str(), "RF-2025-0001");

        let patch = ConfigPatch {
            prefix: Some("SIG".to_string()),
            padding_width: Some(6),
            reset_cadence: Some(ResetCadence::Monthly),
        };
        admin.update(&patch).await.unwrap();

        // New cadence sees the stale June reset date as the same window, so
        // the counter carries on under the new rendering.
        assert_eq!(
            allocator.allocate_next().await.unwrap().as_str(),
            "SIG-2025-06-000002"
        );
    }

    #[tokio::test]
    #[ignore = "requires a running postgres; set DATABASE_URL"]
    async fn counter_columns_survive_settings_updates() {
        let pool = fresh_pool().await;
        let clock = FixedClock(date(2025, 6, 15));
        let allocator = PgIdentifierAllocator::with_clock(pool.clone(), clock);
        let admin = PgConfigAdmin::with_clock(pool.clone(), clock);

        allocator.allocate_next().await.unwrap();
        admin
            .update(&ConfigPatch {
                prefix: Some("TRK".to_string()),
                ..ConfigPatch::default()
            })
            .await
            .unwrap();

        let row = sqlx::query("SELECT last_sequence FROM identifier_config WHERE id = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        let last_sequence: i64 = row.try_get("last_sequence").unwrap();
        assert_eq!(last_sequence, 1);
    }

    #[tokio::test]
    #[ignore = "requires a running postgres; set DATABASE_URL"]
    async fn identifiers_carry_the_current_year_on_the_system_clock() {
        let pool = fresh_pool().await;
        let allocator = PgIdentifierAllocator::new(pool);
        let id = allocator.allocate_next().await.unwrap();
        let year = SystemClock.today().year();
        assert_eq!(id.as_str(), format!("RF-{year:04}-0001"));
    }
}

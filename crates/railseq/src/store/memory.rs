use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::store::{ConfigRecord, ConfigStore};

/// How long [`MemoryStore`] waits for exclusive access before giving up
/// with [`Error::LockTimeout`].
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// An in-process [`ConfigStore`] backed by a bounded-wait mutex.
///
/// Clones share the same underlying record, so a cloned store handed to
/// another thread still serializes against the original. "Durable" here
/// means the mutation is visible to every later `transact` call; the record
/// lives only as long as the process.
///
/// Suitable for tests and for single-process deployments that can afford to
/// restart numbering from scratch; anything else should use a store with
/// real durability such as `railseq-pg`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<ConfigRecord>>>,
    lock_timeout: Option<Duration>,
}

impl MemoryStore {
    /// An empty store with the default lock timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the bounded wait for exclusive access.
    pub fn with_lock_timeout(timeout: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            lock_timeout: Some(timeout),
        }
    }
}

impl ConfigStore for MemoryStore {
    fn transact<R>(&self, f: impl FnOnce(&mut Option<ConfigRecord>) -> R) -> Result<R> {
        let timeout = self.lock_timeout.unwrap_or(DEFAULT_LOCK_TIMEOUT);
        let mut guard = self.slot.try_lock_for(timeout).ok_or(Error::LockTimeout)?;
        Ok(f(&mut guard))
    }
}

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants the allocator and its surfaces can emit.
///
/// Allocation never partially applies: when any variant is returned, no
/// sequence number was issued and no state was persisted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Could not serialize against a concurrent allocation within the
    /// store's bounded wait.
    ///
    /// Retryable: the caller should retry the whole record-creation
    /// operation, not just the allocator call.
    #[error("timed out waiting for exclusive access to the identifier record")]
    LockTimeout,

    /// The persistent store could not be read or written.
    ///
    /// Not retryable by the allocator; the enclosing record creation must
    /// abort, since no record may exist without an identifier.
    #[error("identifier store unavailable: {0}")]
    StoreUnavailable(String),

    /// A configuration write was rejected. Raised at settings-write time
    /// only; allocation assumes previously validated settings.
    #[error("invalid identifier settings: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl Error {
    /// Whether the failed operation is worth retrying as a whole.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::LockTimeout)
    }
}

/// Violations detected when validating identifier settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The prefix is empty.
    #[error("prefix cannot be empty")]
    EmptyPrefix,

    /// The prefix exceeds [`MAX_PREFIX_LEN`] characters.
    ///
    /// [`MAX_PREFIX_LEN`]: crate::MAX_PREFIX_LEN
    #[error("prefix is {len} characters, limit is {max}")]
    PrefixTooLong { len: usize, max: usize },

    /// The prefix contains characters other than ASCII letters and digits.
    /// The dash-delimited identifier format stays unambiguous only when the
    /// prefix itself carries no dashes or whitespace.
    #[error("prefix must contain only ASCII letters and digits")]
    PrefixNotAlphanumeric,

    /// The padding width falls outside the accepted range.
    #[error("padding width {width} is outside {min}..={max}")]
    PaddingOutOfRange { width: u32, min: u32, max: u32 },

    /// A stored cadence string did not match any known cadence.
    #[error("unknown reset cadence: {value:?}")]
    UnknownCadence { value: String },
}

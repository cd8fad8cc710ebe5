use crate::error::Result;
use crate::identifier::Identifier;

/// A minimal interface for anything that can issue the next failure
/// identifier.
///
/// The record-creation boundary depends on this seam rather than on a
/// concrete allocator, which keeps it mockable and lets alternative
/// backends (e.g. the PostgreSQL store) slot in behind the same contract.
pub trait IdentifierSource {
    /// Allocates the next identifier, permanently consuming its sequence
    /// number.
    ///
    /// # Errors
    ///
    /// - [`Error::LockTimeout`] when the call could not be serialized
    ///   against concurrent allocations within the store's bounded wait.
    /// - [`Error::StoreUnavailable`] when the backing store is unreachable.
    ///
    /// [`Error::LockTimeout`]: crate::Error::LockTimeout
    /// [`Error::StoreUnavailable`]: crate::Error::StoreUnavailable
    fn allocate_next(&self) -> Result<Identifier>;
}

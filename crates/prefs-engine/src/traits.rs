use prefs_address::Address;
use prefs_types::Timestamp;

use crate::cursor::Cursor;
use crate::error::{EngineError, EngineResult};
use crate::selection::Selection;

/// Row storage addressed by [`Address`].
///
/// All implementations must satisfy these invariants:
/// - Every call is atomic with respect to every other call.
/// - `(module, key)` is unique; `insert_or_replace` never duplicates a row.
/// - Replacing a row keeps its `created` timestamp.
/// - Strings are returned exactly as they were stored.
/// - Addresses whose authority differs from [`authority`](Self::authority)
///   are rejected with [`EngineError::Unavailable`].
pub trait StorageEngine: Send + Sync {
    /// The authority this engine is registered under.
    fn authority(&self) -> &str;

    /// Insert `value` at an entry address, or replace the value already
    /// stored there.
    ///
    /// A new row gets `created = updated = now`. An existing row gets
    /// `updated = now` and keeps `created`.
    fn insert_or_replace(&self, address: &Address, value: &str, now: Timestamp) -> EngineResult<()>;

    /// Open a cursor over every row the address selects.
    ///
    /// Row order is engine-defined.
    fn query(&self, address: &Address) -> EngineResult<Cursor>;

    /// Delete every row the address selects that also satisfies `selection`,
    /// returning how many rows were removed.
    fn delete(&self, address: &Address, selection: Option<&Selection>) -> EngineResult<usize>;

    /// Count the rows the address selects.
    ///
    /// Default implementation drains a cursor. Backends may override.
    fn count(&self, address: &Address) -> EngineResult<usize> {
        Ok(self.query(address)?.len())
    }
}

/// Reject addresses that belong to another authority.
pub(crate) fn check_authority(authority: &str, address: &Address) -> EngineResult<()> {
    if address.authority() != authority {
        return Err(EngineError::Unavailable {
            address: address.to_string(),
            reason: format!("no engine registered for authority {:?}", address.authority()),
        });
    }
    Ok(())
}

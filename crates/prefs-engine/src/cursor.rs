use prefs_address::Address;
use prefs_types::Entry;
use tracing::trace;

/// An owning iterator over the rows returned by a query.
///
/// The cursor holds a snapshot taken while the engine's lock was held, so
/// iterating never blocks writers. Dropping the cursor releases it, whether
/// or not it was drained.
#[derive(Debug)]
pub struct Cursor {
    address: String,
    rows: std::vec::IntoIter<Entry>,
}

impl Cursor {
    /// Wrap a materialized result set.
    pub fn new(address: &Address, rows: Vec<Entry>) -> Self {
        trace!(%address, rows = rows.len(), "cursor opened");
        Self {
            address: address.to_string(),
            rows: rows.into_iter(),
        }
    }
}

impl Iterator for Cursor {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for Cursor {}

impl Drop for Cursor {
    fn drop(&mut self) {
        trace!(address = %self.address, unread = self.rows.len(), "cursor closed");
    }
}

//! The row table shared by the bundled engines.

use std::collections::BTreeMap;

use prefs_address::Address;
use prefs_types::{Entry, Timestamp};

use crate::error::{EngineError, EngineResult};
use crate::selection::Selection;

/// Rows keyed by `(module, key)`, ordered by module then key.
#[derive(Clone, Debug, Default)]
pub(crate) struct Table {
    rows: BTreeMap<(String, String), Entry>,
}

impl Table {
    pub(crate) fn from_rows(rows: impl IntoIterator<Item = Entry>) -> Self {
        let rows = rows
            .into_iter()
            .map(|e| ((e.module.clone(), e.key.clone()), e))
            .collect();
        Self { rows }
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &Entry> {
        self.rows.values()
    }

    /// Returns `true` if a new row was created, `false` if one was replaced.
    ///
    /// A replaced row's `updated` always moves forward, even when `now` is
    /// behind the stored value (another writer's clock, or a row loaded from
    /// disk that was stamped ahead of this host).
    pub(crate) fn upsert(
        &mut self,
        address: &Address,
        value: &str,
        now: Timestamp,
    ) -> EngineResult<bool> {
        let (Some(module), Some(key)) = (address.module(), address.key()) else {
            return Err(EngineError::NotAnEntry {
                address: address.to_string(),
            });
        };

        match self.rows.get_mut(&(module.to_string(), key.to_string())) {
            Some(existing) => {
                let at = now.max(existing.updated.next());
                existing.replace_value(value, at);
                Ok(false)
            }
            None => {
                self.rows.insert(
                    (module.to_string(), key.to_string()),
                    Entry::new(module, key, value, now),
                );
                Ok(true)
            }
        }
    }

    pub(crate) fn select(&self, address: &Address) -> Vec<Entry> {
        self.rows
            .values()
            .filter(|e| address.matches(&e.module, &e.key))
            .cloned()
            .collect()
    }

    pub(crate) fn delete(&mut self, address: &Address, selection: Option<&Selection>) -> usize {
        let before = self.rows.len();
        self.rows.retain(|_, e| {
            let hit = address.matches(&e.module, &e.key)
                && selection.map_or(true, |s| s.matches(e));
            !hit
        });
        before - self.rows.len()
    }
}

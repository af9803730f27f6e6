//! The persisted record.

use serde::{Deserialize, Serialize};

use crate::temporal::Timestamp;

/// A single stored preference.
///
/// At most one `Entry` exists per `(module, key)` pair. `created` is fixed at
/// the first insert; `updated` moves on every write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Logical namespace the entry belongs to.
    pub module: String,
    /// Identifier, unique within `module`.
    pub key: String,
    /// Opaque payload.
    pub value: String,
    /// Time of the first insert.
    pub created: Timestamp,
    /// Time of the most recent insert or replace.
    pub updated: Timestamp,
}

impl Entry {
    /// A freshly inserted entry: `created == updated == at`.
    pub fn new(
        module: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        at: Timestamp,
    ) -> Self {
        Self {
            module: module.into(),
            key: key.into(),
            value: value.into(),
            created: at,
            updated: at,
        }
    }

    /// Replace the value in place, keeping `created`.
    pub fn replace_value(&mut self, value: impl Into<String>, at: Timestamp) {
        self.value = value.into();
        self.updated = at;
    }
}

//! Handles on a single module's entries.

use std::fmt;
use std::hash::{Hash, Hasher};

use prefs_types::Entry;
use tracing::debug;

use crate::error::Result;
use crate::helper::StoreHelper;

/// The entries belonging to one module.
///
/// A handle carries the module name and the store it was issued by. It has
/// no state of its own. Two handles are equal when their module names are,
/// regardless of which store issued them.
#[derive(Clone)]
pub struct ModuleHandle {
    name: String,
    store: StoreHelper,
}

impl ModuleHandle {
    pub(crate) fn new(name: String, store: StoreHelper) -> Self {
        Self { name, store }
    }

    pub fn module_name(&self) -> &str {
        &self.name
    }

    /// Delete every entry of this module, returning how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let address = self.store.codec().module(&self.name)?;
        let removed = self.store.delete(&address, None)?;
        debug!(module = %self.name, removed, "module cleared");
        Ok(removed)
    }

    /// Save `value` under `key` in this module. An absent value is ignored.
    pub fn put(&self, key: &str, value: Option<&str>) -> Result<()> {
        self.store.persist(&self.name, key, value)
    }

    pub fn get(&self, key: &str) -> Result<Option<Entry>> {
        self.store.get(&self.name, key)
    }

    /// Delete one entry. Returns `true` if it existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let address = self.store.codec().entry(&self.name, key)?;
        Ok(self.store.delete(&address, None)? > 0)
    }

    /// Every entry of this module.
    pub fn entries(&self) -> Result<Vec<Entry>> {
        let address = self.store.codec().module(&self.name)?;
        self.store.query(&address)
    }
}

impl PartialEq for ModuleHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ModuleHandle {}

impl Hash for ModuleHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("name", &self.name)
            .field("authority", &self.store.codec().authority())
            .finish()
    }
}

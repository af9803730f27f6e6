//! In-memory storage engine for testing and ephemeral use.
//!
//! [`InMemoryEngine`] stores all rows in a `BTreeMap` protected by a
//! `RwLock`. It implements the full [`StorageEngine`] trait and is suitable
//! for unit tests and short-lived processes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use prefs_address::Address;
use prefs_types::Timestamp;
use tracing::debug;

use crate::cursor::Cursor;
use crate::error::{EngineError, EngineResult};
use crate::selection::Selection;
use crate::table::Table;
use crate::traits::{check_authority, StorageEngine};

/// An in-memory implementation of [`StorageEngine`].
///
/// Data is lost when the engine is dropped. After [`close`](Self::close)
/// every call fails with [`EngineError::Unavailable`].
#[derive(Debug)]
pub struct InMemoryEngine {
    authority: String,
    table: RwLock<Table>,
    open: AtomicBool,
}

impl InMemoryEngine {
    /// Create a new empty engine serving `authority`.
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            table: RwLock::new(Table::default()),
            open: AtomicBool::new(true),
        }
    }

    /// Shut the engine down. Stored rows are kept but unreachable.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    /// Returns `true` until [`close`](Self::close) is called.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Number of rows currently stored.
    pub fn len(&self) -> EngineResult<usize> {
        Ok(self.read()?.len())
    }

    /// Returns `true` if no rows are stored.
    pub fn is_empty(&self) -> EngineResult<bool> {
        Ok(self.len()? == 0)
    }

    fn check(&self, address: &Address) -> EngineResult<()> {
        if !self.is_open() {
            return Err(EngineError::Unavailable {
                address: address.to_string(),
                reason: "engine is closed".into(),
            });
        }
        check_authority(&self.authority, address)
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, Table>> {
        self.table
            .read()
            .map_err(|e| EngineError::Poisoned(e.to_string()))
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, Table>> {
        self.table
            .write()
            .map_err(|e| EngineError::Poisoned(e.to_string()))
    }
}

impl StorageEngine for InMemoryEngine {
    fn authority(&self) -> &str {
        &self.authority
    }

    fn insert_or_replace(
        &self,
        address: &Address,
        value: &str,
        now: Timestamp,
    ) -> EngineResult<()> {
        self.check(address)?;
        let inserted = self.write()?.upsert(address, value, now)?;
        debug!(%address, inserted, "row written");
        Ok(())
    }

    fn query(&self, address: &Address) -> EngineResult<Cursor> {
        self.check(address)?;
        let rows = self.read()?.select(address);
        Ok(Cursor::new(address, rows))
    }

    fn delete(&self, address: &Address, selection: Option<&Selection>) -> EngineResult<usize> {
        self.check(address)?;
        let removed = self.write()?.delete(address, selection);
        debug!(%address, removed, "rows deleted");
        Ok(removed)
    }

    fn count(&self, address: &Address) -> EngineResult<usize> {
        self.check(address)?;
        Ok(self
            .read()?
            .rows()
            .filter(|e| address.matches(&e.module, &e.key))
            .count())
    }
}

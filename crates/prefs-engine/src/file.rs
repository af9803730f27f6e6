//! File-backed storage engine.
//!
//! Rows are held in memory and written through to a single JSON document on
//! every mutation. The document is replaced atomically: it is serialized into
//! a temporary file in the same directory, synced, and renamed over the old
//! one, so readers of the file never observe a partial write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use prefs_address::Address;
use prefs_types::{Entry, Timestamp};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::cursor::Cursor;
use crate::error::{EngineError, EngineResult};
use crate::selection::Selection;
use crate::table::Table;
use crate::traits::{check_authority, StorageEngine};

/// On-disk layout of the store file.
#[derive(Debug, Serialize, Deserialize)]
struct Document {
    authority: String,
    rows: Vec<Entry>,
}

/// A [`StorageEngine`] persisted to `{dir}/{file_name}`.
#[derive(Debug)]
pub struct FileEngine {
    authority: String,
    dir: PathBuf,
    path: PathBuf,
    table: RwLock<Table>,
}

impl FileEngine {
    /// Open (or create) the store file `file_name` inside `dir`.
    ///
    /// `dir` must already exist; a missing directory means the backing
    /// storage was never provisioned and is reported as
    /// [`EngineError::Unavailable`]. An existing file must belong to
    /// `authority`.
    pub fn open(
        dir: impl AsRef<Path>,
        file_name: &str,
        authority: impl Into<String>,
    ) -> EngineResult<Self> {
        let authority = authority.into();
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(EngineError::Unavailable {
                address: format!("content://{authority}"),
                reason: format!("data directory {} does not exist", dir.display()),
            });
        }
        let path = dir.join(file_name);

        let table = if path.exists() {
            let bytes = fs::read(&path)?;
            let doc: Document = serde_json::from_slice(&bytes)?;
            if doc.authority != authority {
                return Err(EngineError::AuthorityMismatch {
                    path,
                    expected: authority,
                    found: doc.authority,
                });
            }
            Table::from_rows(doc.rows)
        } else {
            Table::default()
        };

        info!(path = %path.display(), rows = table.len(), "file engine opened");
        Ok(Self {
            authority,
            dir,
            path,
            table: RwLock::new(table),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
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
        check_authority(&self.authority, address)?;
        if !self.dir.is_dir() {
            return Err(EngineError::Unavailable {
                address: address.to_string(),
                reason: format!("data directory {} has gone away", self.dir.display()),
            });
        }
        Ok(())
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

    /// Write `table` to disk, replacing the current file.
    fn flush(&self, table: &Table) -> EngineResult<()> {
        let doc = Document {
            authority: self.authority.clone(),
            rows: table.rows().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&doc)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| EngineError::Io(e.error))?;
        Ok(())
    }

    /// Apply `mutate` to a copy of the table, write the copy to disk, and
    /// only then install it. A failed write leaves memory and disk agreeing.
    fn mutate<T>(
        &self,
        mutate: impl FnOnce(&mut Table) -> EngineResult<(T, bool)>,
    ) -> EngineResult<T> {
        let mut table = self.write()?;
        let mut next = table.clone();
        let (out, dirty) = mutate(&mut next)?;
        if dirty {
            self.flush(&next)?;
            *table = next;
        }
        Ok(out)
    }
}

impl StorageEngine for FileEngine {
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
        let inserted = self.mutate(|t| Ok((t.upsert(address, value, now)?, true)))?;
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
        let removed = self.mutate(|t| {
            let removed = t.delete(address, selection);
            Ok((removed, removed > 0))
        })?;
        debug!(%address, removed, "rows deleted");
        Ok(removed)
    }
}

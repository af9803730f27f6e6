use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use prefs_address::{Address, AddressCodec};
use prefs_engine::{Column, FileEngine, InMemoryEngine, Selection, StorageEngine};
use prefs_types::{Clock, Entry, SystemClock};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{PrefsError, Result};
use crate::module::ModuleHandle;

/// Orchestrates addressing, upserts, queries, and bulk deletes on top of a
/// [`StorageEngine`].
///
/// The helper holds no row state of its own. Cloning it is cheap and every
/// clone talks to the same engine.
#[derive(Clone)]
pub struct StoreHelper {
    engine: Arc<dyn StorageEngine>,
    codec: AddressCodec,
    clock: Arc<dyn Clock>,
}

impl StoreHelper {
    /// Create a helper over `engine`, issuing addresses under the engine's
    /// authority and stamping rows with a [`SystemClock`].
    pub fn new(engine: Arc<dyn StorageEngine>) -> Result<Self> {
        let codec = AddressCodec::new(engine.authority())?;
        Ok(Self {
            engine,
            codec,
            clock: Arc::new(SystemClock::new()),
        })
    }

    /// Replace the clock used to stamp `created`/`updated`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the engine described by `config` and wrap it.
    ///
    /// A `data_dir` selects the [`FileEngine`]; otherwise rows live in an
    /// [`InMemoryEngine`].
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let engine: Arc<dyn StorageEngine> = match &config.data_dir {
            Some(dir) => Arc::new(FileEngine::open(dir, &config.file_name, &config.authority)?),
            None => Arc::new(InMemoryEngine::new(&config.authority)),
        };
        Self::new(engine)
    }

    /// The codec that builds this helper's addresses.
    pub fn codec(&self) -> &AddressCodec {
        &self.codec
    }

    // ---- Addressing ----

    /// Build an address; see [`AddressCodec::encode`] for the granularity
    /// rules. A key without a module is rejected.
    pub fn address(&self, module: Option<&str>, key: Option<&str>) -> Result<Address> {
        Ok(self.codec.encode(module, key)?)
    }

    // ---- Writes ----

    /// Save `value` under `(module, key)`.
    ///
    /// An absent value is ignored. Otherwise the entry is created, or its
    /// value replaced with `created` left untouched.
    pub fn persist(&self, module: &str, key: &str, value: Option<&str>) -> Result<()> {
        let Some(value) = value else {
            debug!(module, key, "persist skipped: no value");
            return Ok(());
        };
        let address = self.codec.entry(module, key)?;
        let now = self.clock.now();
        self.engine
            .insert_or_replace(&address, value, now)
            .map_err(|e| self.surface(e))?;
        debug!(%address, %now, "persisted");
        Ok(())
    }

    // ---- Reads ----

    /// Every entry of every module.
    pub fn query_all(&self) -> Result<Vec<Entry>> {
        self.query(&self.codec.root())
    }

    /// Every entry the address selects: all entries for the root, one
    /// module's entries for a module address, at most one entry for an entry
    /// address.
    ///
    /// Fails with [`PrefsError::Access`] if the engine cannot be reached.
    pub fn query(&self, address: &Address) -> Result<Vec<Entry>> {
        let cursor = self.engine.query(address).map_err(|e| self.surface(e))?;
        Ok(cursor.collect())
    }

    /// The single entry stored under `(module, key)`.
    pub fn get(&self, module: &str, key: &str) -> Result<Option<Entry>> {
        let address = self.codec.entry(module, key)?;
        Ok(self.query(&address)?.into_iter().next())
    }

    /// Total number of stored entries.
    pub fn len(&self) -> Result<usize> {
        self.engine
            .count(&self.codec.root())
            .map_err(|e| self.surface(e))
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // ---- Modules ----

    /// A handle on the entries of `name`.
    pub fn module(&self, name: impl Into<String>) -> Result<ModuleHandle> {
        let name = name.into();
        // Validates the name the same way persist does.
        self.codec.module(&name)?;
        Ok(ModuleHandle::new(name, self.clone()))
    }

    // ---- Bulk deletes ----

    /// Delete every entry of every module.
    pub fn clear(&self) -> Result<usize> {
        let removed = self.delete(&self.codec.root(), None)?;
        info!(removed, "cleared all modules");
        Ok(removed)
    }

    /// Delete the entries of each given module.
    ///
    /// `None` slots are skipped. An empty slice deletes nothing, unlike
    /// [`clear`](Self::clear).
    pub fn clear_modules(&self, modules: &[Option<&ModuleHandle>]) -> Result<usize> {
        let mut removed = 0;
        for module in modules.iter().flatten() {
            removed += module.clear()?;
        }
        Ok(removed)
    }

    /// Delete every entry except those of the given modules.
    ///
    /// - `None` clears everything.
    /// - A slice that is empty or holds only `None` preserves nothing and
    ///   also clears everything.
    /// - Otherwise deletes with `module != ? AND module != ? ...` over the
    ///   distinct module names.
    pub fn clear_but(&self, modules: Option<&[Option<&ModuleHandle>]>) -> Result<usize> {
        let Some(modules) = modules else {
            return self.clear();
        };

        let preserved: BTreeSet<&str> = modules
            .iter()
            .flatten()
            .map(|m| m.module_name())
            .collect();
        if preserved.is_empty() {
            return self.clear();
        }

        let selection = preserved
            .iter()
            .fold(Selection::new(), |sel, name| sel.and_not_equal(Column::Module, *name));
        let removed = self.delete(&self.codec.root(), Some(&selection))?;
        info!(removed, preserved = ?preserved, "cleared all but preserved modules");
        Ok(removed)
    }

    pub(crate) fn delete(&self, address: &Address, selection: Option<&Selection>) -> Result<usize> {
        self.engine
            .delete(address, selection)
            .map_err(|e| self.surface(e))
    }

    /// Convert an engine error, logging the ones that indicate a broken setup.
    fn surface(&self, e: prefs_engine::EngineError) -> PrefsError {
        if e.is_unavailable() {
            warn!(authority = self.codec.authority(), error = %e, "storage engine not accessible");
        }
        e.into()
    }
}

impl fmt::Debug for StoreHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHelper")
            .field("authority", &self.codec.authority())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefs_types::{ManualClock, Timestamp};
    use std::thread;
    use std::time::Duration;

    const KEY_A: &str = "foo";
    const KEY_B: &str = "foo2";
    const MODULE_A: &str = "common";
    const MODULE_B: &str = "common2";
    const MODULE_C: &str = "common3";
    const MODULE_D: &str = "package.test";
    const STRING_A: &str = "fooBar";
    const STRING_B: &str = "fooBar2";

    fn store() -> StoreHelper {
        StoreHelper::new(Arc::new(InMemoryEngine::new("test.prefs"))).unwrap()
    }

    fn fill(store: &StoreHelper, modules: &[&str]) {
        for module in modules {
            store.persist(module, KEY_A, Some(STRING_A)).unwrap();
            store.persist(module, KEY_B, Some(STRING_B)).unwrap();
        }
    }

    fn assert_size(store: &StoreHelper, expected: usize) {
        assert_eq!(store.query_all().unwrap().len(), expected);
    }

    #[test]
    fn persist_then_query_single() {
        let s = store();
        s.persist(MODULE_A, KEY_A, Some(STRING_A)).unwrap();
        assert_size(&s, 1);

        let address = s.address(Some(MODULE_A), Some(KEY_A)).unwrap();
        let list = s.query(&address).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].value, STRING_A);
        assert_eq!(list[0].key, KEY_A);
        assert_eq!(list[0].module, MODULE_A);
    }

    #[test]
    fn persist_absent_value_is_noop() {
        let s = store();
        s.persist(MODULE_A, KEY_A, None).unwrap();
        assert_size(&s, 0);
    }

    #[test]
    fn persist_override_keeps_one_entry() {
        let s = store();
        s.persist(MODULE_A, KEY_A, Some(STRING_A)).unwrap();
        s.persist(MODULE_A, KEY_A, Some(STRING_B)).unwrap();
        assert_size(&s, 1);
        assert_eq!(s.get(MODULE_A, KEY_A).unwrap().unwrap().value, STRING_B);
    }

    #[test]
    fn same_key_in_two_modules() {
        let s = store();
        s.persist(MODULE_A, KEY_A, Some(STRING_A)).unwrap();
        s.persist(MODULE_B, KEY_A, Some(STRING_A)).unwrap();
        assert_size(&s, 2);
    }

    #[test]
    fn two_keys_in_one_module() {
        let s = store();
        s.persist(MODULE_A, KEY_A, Some(STRING_A)).unwrap();
        s.persist(MODULE_A, KEY_B, Some(STRING_A)).unwrap();
        assert_size(&s, 2);
    }

    #[test]
    fn persist_rejects_empty_module() {
        let s = store();
        let err = s.persist("", KEY_A, Some(STRING_A)).unwrap_err();
        assert!(matches!(err, PrefsError::InvalidAddress(_)));
    }

    #[test]
    fn created_equals_updated_on_first_insert() {
        let s = store();
        let start = Timestamp::now();
        s.persist(MODULE_A, KEY_A, Some(STRING_A)).unwrap();

        let entry = s.get(MODULE_A, KEY_A).unwrap().unwrap();
        assert_eq!(entry.created, entry.updated);
        assert!(entry.created.as_millis().abs_diff(start.as_millis()) < 100);
    }

    #[test]
    fn update_moves_updated_and_keeps_created() {
        let s = store();
        s.persist(MODULE_A, KEY_A, Some(STRING_A)).unwrap();
        let first = s.get(MODULE_A, KEY_A).unwrap().unwrap();

        thread::sleep(Duration::from_millis(10));
        s.persist(MODULE_A, KEY_A, Some(STRING_B)).unwrap();
        let second = s.get(MODULE_A, KEY_A).unwrap().unwrap();

        assert_eq!(second.value, STRING_B);
        assert_eq!(second.created, first.created);
        assert!(second.updated.is_after(&first.updated));
    }

    #[test]
    fn updated_increases_within_one_millisecond() {
        // A frozen manual clock would repeat; the system clock must not.
        let s = store();
        s.persist(MODULE_A, KEY_A, Some(STRING_A)).unwrap();
        let first = s.get(MODULE_A, KEY_A).unwrap().unwrap();
        s.persist(MODULE_A, KEY_A, Some(STRING_B)).unwrap();
        let second = s.get(MODULE_A, KEY_A).unwrap().unwrap();
        assert!(second.updated > first.updated);
    }

    #[test]
    fn writers_sharing_an_engine_keep_updated_increasing() {
        let engine: Arc<dyn StorageEngine> = Arc::new(InMemoryEngine::new("test.prefs"));
        let a = StoreHelper::new(Arc::clone(&engine)).unwrap();
        let b = StoreHelper::new(engine).unwrap();

        a.persist(MODULE_A, KEY_A, Some(STRING_A)).unwrap();
        let mut prev = a.get(MODULE_A, KEY_A).unwrap().unwrap();
        for i in 0..200 {
            let writer = if i % 2 == 0 { &b } else { &a };
            writer.persist(MODULE_A, KEY_A, Some(i.to_string().as_str())).unwrap();
            let next = a.get(MODULE_A, KEY_A).unwrap().unwrap();
            assert!(next.updated > prev.updated, "write {i}: {prev:?} -> {next:?}");
            assert_eq!(next.created, prev.created);
            prev = next;
        }
    }

    #[test]
    fn writer_with_lagging_clock_still_advances_updated() {
        let engine: Arc<dyn StorageEngine> = Arc::new(InMemoryEngine::new("test.prefs"));
        let ahead = StoreHelper::new(Arc::clone(&engine))
            .unwrap()
            .with_clock(Arc::new(ManualClock::starting_at(Timestamp::from_millis(5_000))));
        let behind = StoreHelper::new(engine)
            .unwrap()
            .with_clock(Arc::new(ManualClock::starting_at(Timestamp::from_millis(1_000))));

        ahead.persist(MODULE_A, KEY_A, Some(STRING_A)).unwrap();
        behind.persist(MODULE_A, KEY_A, Some(STRING_B)).unwrap();

        let e = behind.get(MODULE_A, KEY_A).unwrap().unwrap();
        assert_eq!(e.value, STRING_B);
        assert_eq!(e.created, Timestamp::from_millis(5_000));
        assert_eq!(e.updated, Timestamp::from_millis(5_001));
    }

    #[test]
    fn stored_row_ahead_of_clock_is_replaced_forward() {
        let dir = tempfile::tempdir().unwrap();
        let future = Timestamp::now().as_millis() + 3_600_000;
        let doc = serde_json::json!({
            "authority": "cfg.prefs",
            "rows": [{
                "module": MODULE_A,
                "key": KEY_A,
                "value": STRING_A,
                "created": future,
                "updated": future,
            }],
        });
        std::fs::write(dir.path().join("prefs.json"), doc.to_string()).unwrap();

        let s = StoreHelper::open(&StoreConfig::file_backed("cfg.prefs", dir.path())).unwrap();
        s.persist(MODULE_A, KEY_A, Some(STRING_B)).unwrap();

        let e = s.get(MODULE_A, KEY_A).unwrap().unwrap();
        assert_eq!(e.value, STRING_B);
        assert_eq!(e.created, Timestamp::from_millis(future));
        assert!(e.updated > e.created);
    }

    #[test]
    fn injected_clock_stamps_rows() {
        let clock = Arc::new(ManualClock::starting_at(Timestamp::from_millis(1_000)));
        let s = store().with_clock(clock.clone());

        s.persist(MODULE_A, KEY_A, Some(STRING_A)).unwrap();
        clock.advance(250);
        s.persist(MODULE_A, KEY_A, Some(STRING_B)).unwrap();

        let e = s.get(MODULE_A, KEY_A).unwrap().unwrap();
        assert_eq!(e.created, Timestamp::from_millis(1_000));
        assert_eq!(e.updated, Timestamp::from_millis(1_250));
    }

    #[test]
    fn query_granularities() {
        let s = store();
        fill(&s, &[MODULE_A, MODULE_B]);

        assert_eq!(s.query(&s.address(None, None).unwrap()).unwrap().len(), 4);

        let module = s.query(&s.address(Some(MODULE_A), None).unwrap()).unwrap();
        assert_eq!(module.len(), 2);
        assert_ne!(module[0].value, module[1].value);

        let single = s.query(&s.address(Some(MODULE_A), Some(KEY_A)).unwrap()).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].value, STRING_A);
    }

    #[test]
    fn key_without_module_is_invalid() {
        let err = store().address(None, Some(KEY_A)).unwrap_err();
        assert!(matches!(err, PrefsError::InvalidAddress(_)));
    }

    #[test]
    fn special_characters_round_trip() {
        let cases = [
            (MODULE_A, "^&*ü"),
            ("!@#$ä", KEY_A),
            (MODULE_A, "test/blubb/one"),
            ("test/blubb/one", KEY_A),
            (MODULE_A, "test'blubb"),
            ("test'blubb", KEY_A),
        ];
        let s = store();
        for (module, key) in cases {
            s.persist(module, key, Some(STRING_A)).unwrap();
            assert_size(&s, 1);

            let list = s.query(&s.address(Some(module), None).unwrap()).unwrap();
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].module, module);
            assert_eq!(list[0].key, key);

            s.clear().unwrap();
            assert_size(&s, 0);
        }
    }

    #[test]
    fn clear_removes_everything() {
        let s = store();
        assert_eq!(s.clear().unwrap(), 0);

        fill(&s, &[MODULE_A, MODULE_B]);
        assert_size(&s, 4);
        assert_eq!(s.clear().unwrap(), 4);
        assert_size(&s, 0);
        assert!(s.is_empty().unwrap());
    }

    #[test]
    fn clear_modules() {
        let s = store();
        fill(&s, &[MODULE_A, MODULE_B]);
        assert_size(&s, 4);

        let a = s.module(MODULE_A).unwrap();
        let b = s.module(MODULE_B).unwrap();

        assert_eq!(s.clear_modules(&[Some(&a)]).unwrap(), 2);
        let rest = s.query_all().unwrap();
        assert_eq!(rest.len(), 2);
        assert!(rest.iter().all(|e| e.module == MODULE_B));

        s.clear_modules(&[Some(&b)]).unwrap();
        assert_size(&s, 0);

        fill(&s, &[MODULE_A]);
        assert_eq!(s.clear_modules(&[None]).unwrap(), 0);
        assert_eq!(s.clear_modules(&[]).unwrap(), 0);
        assert_size(&s, 2);
    }

    #[test]
    fn clear_but_sequence() {
        let s = store();
        fill(&s, &[MODULE_A, MODULE_B, MODULE_C, MODULE_D]);
        assert_size(&s, 8);

        let a = s.module(MODULE_A).unwrap();
        let b = s.module(MODULE_B).unwrap();
        let d = s.module(MODULE_D).unwrap();

        s.clear_but(Some(&[Some(&d), Some(&a), Some(&b)])).unwrap();
        assert_size(&s, 6);

        s.clear_but(Some(&[Some(&a), Some(&b)])).unwrap();
        assert_size(&s, 4);

        s.clear_but(Some(&[Some(&a)])).unwrap();
        assert_size(&s, 2);

        s.clear_but(Some(&[None])).unwrap();
        assert_size(&s, 0);

        fill(&s, &[MODULE_A, MODULE_D]);
        s.clear_but(Some(&[Some(&d)])).unwrap();
        assert_size(&s, 2);

        fill(&s, &[MODULE_A]);
        s.clear_but(Some(&[None])).unwrap();
        assert_size(&s, 0);
    }

    #[test]
    fn clear_but_retains_exactly_preserved_modules() {
        let s = store();
        fill(&s, &[MODULE_A, MODULE_B, MODULE_C, MODULE_D]);
        s.persist(MODULE_A, "extra", Some("x")).unwrap();

        let a = s.module(MODULE_A).unwrap();
        let b = s.module(MODULE_B).unwrap();
        let removed = s.clear_but(Some(&[Some(&a), Some(&b)])).unwrap();
        assert_eq!(removed, 4);

        let rest = s.query_all().unwrap();
        assert_eq!(rest.len(), 5);
        assert!(rest.iter().all(|e| e.module == MODULE_A || e.module == MODULE_B));
    }

    #[test]
    fn clear_but_absent_or_empty_clears_everything() {
        let s = store();
        fill(&s, &[MODULE_A, MODULE_B]);
        s.clear_but(None).unwrap();
        assert_size(&s, 0);

        fill(&s, &[MODULE_A, MODULE_B]);
        s.clear_but(Some(&[])).unwrap();
        assert_size(&s, 0);
    }

    #[test]
    fn clear_but_duplicates_collapse() {
        let s = store();
        fill(&s, &[MODULE_A, MODULE_B]);
        let a1 = s.module(MODULE_A).unwrap();
        let a2 = s.module(MODULE_A).unwrap();

        s.clear_but(Some(&[Some(&a1), None, Some(&a2)])).unwrap();
        let rest = s.query_all().unwrap();
        assert_eq!(rest.len(), 2);
        assert!(rest.iter().all(|e| e.module == MODULE_A));
    }

    #[test]
    fn closed_engine_surfaces_access_error() {
        let engine = Arc::new(InMemoryEngine::new("test.prefs"));
        let s = StoreHelper::new(engine.clone()).unwrap();
        s.persist(MODULE_A, KEY_A, Some(STRING_A)).unwrap();

        engine.close();
        assert!(matches!(s.query_all().unwrap_err(), PrefsError::Access { .. }));
        assert!(matches!(
            s.persist(MODULE_A, KEY_A, Some(STRING_B)).unwrap_err(),
            PrefsError::Access { .. }
        ));
        assert!(matches!(s.clear().unwrap_err(), PrefsError::Access { .. }));
    }

    #[test]
    fn foreign_authority_address_is_inaccessible() {
        let s = store();
        let foreign = AddressCodec::new("other.prefs").unwrap().root();
        let err = s.query(&foreign).unwrap_err();
        assert!(matches!(err, PrefsError::Access { .. }), "got: {err}");
        assert!(err.to_string().contains("content://other.prefs"));
    }

    #[test]
    fn open_in_memory_from_config() {
        let s = StoreHelper::open(&StoreConfig::in_memory("cfg.prefs")).unwrap();
        assert_eq!(s.codec().authority(), "cfg.prefs");
        s.persist(MODULE_A, KEY_A, Some(STRING_A)).unwrap();
        assert_eq!(s.len().unwrap(), 1);
    }

    #[test]
    fn open_file_backed_from_config_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::file_backed("cfg.prefs", dir.path());
        {
            let s = StoreHelper::open(&config).unwrap();
            fill(&s, &[MODULE_A, MODULE_B]);
        }

        let s = StoreHelper::open(&config).unwrap();
        assert_size(&s, 4);
        let b = s.module(MODULE_B).unwrap();
        s.clear_but(Some(&[Some(&b)])).unwrap();

        let s = StoreHelper::open(&config).unwrap();
        let rest = s.query_all().unwrap();
        assert_eq!(rest.len(), 2);
        assert!(rest.iter().all(|e| e.module == MODULE_B));
    }

    #[test]
    fn open_missing_data_dir_is_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::file_backed("cfg.prefs", dir.path().join("absent"));
        let err = StoreHelper::open(&config).unwrap_err();
        assert!(matches!(err, PrefsError::Access { .. }));
    }

    #[test]
    fn invalid_authority_in_config() {
        let err = StoreHelper::open(&StoreConfig::in_memory("bad/authority")).unwrap_err();
        assert!(matches!(err, PrefsError::InvalidAddress(_)));
    }
}

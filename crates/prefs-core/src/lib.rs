//! Module-scoped preference store.
//!
//! [`StoreHelper`] is the entry point: it turns `(module, key)` pairs into
//! addresses, upserts values with creation/update timestamps, answers queries
//! at root, module, or entry granularity, and implements the bulk deletion
//! policies `clear`, `clear_modules`, and `clear_but`.
//!
//! ```
//! use std::sync::Arc;
//! use prefs_core::StoreHelper;
//! use prefs_engine::InMemoryEngine;
//!
//! let store = StoreHelper::new(Arc::new(InMemoryEngine::new("app.prefs"))).unwrap();
//! store.persist("common", "theme", Some("dark")).unwrap();
//! store.persist("cache", "etag", Some("abc")).unwrap();
//!
//! let common = store.module("common").unwrap();
//! store.clear_but(Some(&[Some(&common)])).unwrap();
//!
//! assert_eq!(store.query_all().unwrap().len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod helper;
pub mod module;

pub use config::StoreConfig;
pub use error::{PrefsError, Result};
pub use helper::StoreHelper;
pub use module::ModuleHandle;

// Re-export key types
pub use prefs_address::{Address, AddressCodec, Scope};
pub use prefs_types::{Clock, Entry, ManualClock, SystemClock, Timestamp};

//! Storage engines for prefs.
//!
//! The prefs core never touches rows directly. It hands an
//! [`Address`](prefs_address::Address) and, for deletes, an optional
//! [`Selection`] to a [`StorageEngine`], which owns the rows and guarantees
//! that every call is atomic.
//!
//! # Engines
//!
//! - [`InMemoryEngine`] -- row table behind an `RwLock`, for tests and
//!   embedding
//! - [`FileEngine`] -- the same table, persisted to a JSON file that is
//!   atomically rewritten on every mutation
//!
//! # Contract
//!
//! 1. At most one row per `(module, key)`; inserts replace.
//! 2. A replace keeps the row's `created` timestamp.
//! 3. Reads and deletes act at the granularity of the address.
//! 4. An engine serves exactly one authority. Addresses for any other
//!    authority, and every call after shutdown, fail with
//!    [`EngineError::Unavailable`].
//! 5. Module and key strings are stored and returned byte-for-byte.

pub mod cursor;
pub mod error;
pub mod file;
pub mod memory;
pub mod selection;
pub mod traits;

mod table;

pub use cursor::Cursor;
pub use error::{EngineError, EngineResult};
pub use file::FileEngine;
pub use memory::InMemoryEngine;
pub use selection::{Column, Selection};
pub use traits::StorageEngine;

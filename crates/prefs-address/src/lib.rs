//! Hierarchical addressing for prefs.
//!
//! Every read, write, and delete is routed through an [`Address`] of the form
//!
//! ```text
//! content://{authority}[/{module}[/{key}]]
//! ```
//!
//! The number of path segments is the granularity: the root address selects
//! every entry, a module address selects one module, an entry address selects
//! at most one entry. Module and key are percent-encoded segment by segment,
//! so names containing `/`, `'`, `%` or non-ASCII text round-trip exactly.
//!
//! # Modules
//!
//! - [`error`] — [`AddressError`] and the `Result` alias
//! - [`address`] — The parsed [`Address`] and its [`Scope`]
//! - [`codec`] — [`AddressCodec`], which builds addresses for one authority

pub mod address;
pub mod codec;
pub mod error;

pub use address::{Address, Scope, SCHEME};
pub use codec::{decode_segment, encode_segment, validate_authority, AddressCodec};
pub use error::{AddressError, Result};

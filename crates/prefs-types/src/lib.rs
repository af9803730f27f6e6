//! Foundation types for prefs.
//!
//! This crate provides the record and time types shared by every other prefs
//! crate.
//!
//! # Key Types
//!
//! - [`Entry`] — A persisted `(module, key) -> value` record with creation and
//!   update timestamps
//! - [`Timestamp`] — Milliseconds since the UNIX epoch
//! - [`Clock`] — Source of timestamps; [`SystemClock`] is strictly monotonic,
//!   [`ManualClock`] is driven by hand in tests

pub mod entry;
pub mod temporal;

pub use entry::Entry;
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};

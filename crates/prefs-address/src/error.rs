//! Error types for address construction and parsing.

use thiserror::Error;

/// Errors raised while building or parsing an [`Address`](crate::Address).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// A key was supplied without a module.
    #[error("key without module is not a valid address (key: {key:?})")]
    KeyWithoutModule { key: String },

    /// A module or key segment was empty.
    #[error("{segment} segment must not be empty")]
    EmptySegment { segment: &'static str },

    /// The authority cannot be used in an address.
    #[error("invalid authority {authority:?}: {reason}")]
    InvalidAuthority { authority: String, reason: String },

    /// Address text could not be parsed.
    #[error("malformed address {address:?}: {reason}")]
    Malformed { address: String, reason: String },
}

/// Convenience type alias for address operations.
pub type Result<T> = std::result::Result<T, AddressError>;

use std::path::PathBuf;

/// Errors from storage engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine cannot serve the address: wrong authority, shut down, or
    /// missing backing storage.
    #[error("could not access stored data with address {address}: {reason}")]
    Unavailable { address: String, reason: String },

    /// An insert was issued against an address that does not name one entry.
    #[error("address {address} does not name a single entry")]
    NotAnEntry { address: String },

    /// The backing file holds data for a different authority.
    #[error("{path} belongs to authority {found:?}, expected {expected:?}")]
    AuthorityMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// A lock guarding the row table was poisoned by a panicking writer.
    #[error("row table lock poisoned: {0}")]
    Poisoned(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Returns `true` if the error means the engine could not be reached at
    /// all, as opposed to failing mid-operation.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, EngineError::Unavailable { .. })
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Serialization(e.to_string())
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

use prefs_address::AddressError;
use prefs_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// The storage engine is not reachable. This is a configuration problem:
    /// the engine was never set up for this authority, or has been shut down.
    #[error("storage engine not accessible at {address}: {reason}")]
    Access { address: String, reason: String },

    #[error("engine error: {0}")]
    Engine(EngineError),

    #[error("config error: {0}")]
    Config(String),
}

impl From<EngineError> for PrefsError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Unavailable { address, reason } => PrefsError::Access { address, reason },
            other => PrefsError::Engine(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, PrefsError>;

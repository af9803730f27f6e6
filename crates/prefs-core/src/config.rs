use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PrefsError, Result};

/// Configuration for opening a [`StoreHelper`](crate::StoreHelper).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Authority every address of the store is issued under.
    pub authority: String,
    /// Directory holding the store file. `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    /// Name of the store file inside `data_dir`.
    pub file_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            authority: "prefs.local".into(),
            data_dir: None,
            file_name: "prefs.json".into(),
        }
    }
}

impl StoreConfig {
    /// An in-memory configuration for `authority`.
    pub fn in_memory(authority: impl Into<String>) -> Self {
        Self {
            authority: authority.into(),
            ..Default::default()
        }
    }

    /// A file-backed configuration storing into `data_dir`.
    pub fn file_backed(authority: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            authority: authority.into(),
            data_dir: Some(data_dir.into()),
            ..Default::default()
        }
    }

    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| PrefsError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| PrefsError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

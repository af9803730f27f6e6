//! The parsed address type.

use std::fmt;
use std::str::FromStr;

use crate::codec::{decode_segment, encode_segment, validate_authority};
use crate::error::{AddressError, Result};

/// URI scheme of every address.
pub const SCHEME: &str = "content";

/// A hierarchical address resolving to zero, one, or many entries.
///
/// Addresses hold the *decoded* module and key; escaping only happens when
/// the address is rendered with [`Display`](fmt::Display).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    authority: String,
    module: Option<String>,
    key: Option<String>,
}

/// The granularity an address selects at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Every entry under the authority.
    Root,
    /// Every entry of one module.
    Module(&'a str),
    /// A single `(module, key)` entry.
    Entry { module: &'a str, key: &'a str },
}

impl Address {
    /// Callers are expected to have validated the parts already.
    pub(crate) fn from_parts(
        authority: String,
        module: Option<String>,
        key: Option<String>,
    ) -> Self {
        debug_assert!(module.is_some() || key.is_none());
        Self {
            authority,
            module,
            key,
        }
    }

    /// Parse the textual form `content://{authority}[/{module}[/{key}]]`.
    pub fn parse(text: &str) -> Result<Self> {
        let malformed = |reason: &str| AddressError::Malformed {
            address: text.to_string(),
            reason: reason.to_string(),
        };

        let rest = text
            .strip_prefix(SCHEME)
            .and_then(|r| r.strip_prefix("://"))
            .ok_or_else(|| malformed("expected scheme 'content://'"))?;

        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, Some(path)),
            None => (rest, None),
        };
        validate_authority(authority).map_err(|e| malformed(&e.to_string()))?;

        let (module, key) = match path {
            None => (None, None),
            Some(path) => {
                let mut segments = path.split('/');
                let module = segments.next().map(decode_segment).transpose()?;
                let key = segments.next().map(decode_segment).transpose()?;
                if segments.next().is_some() {
                    return Err(malformed("at most two path segments are allowed"));
                }
                (module, key)
            }
        };

        if module.as_deref() == Some("") {
            return Err(AddressError::EmptySegment { segment: "module" });
        }
        if key.as_deref() == Some("") {
            return Err(AddressError::EmptySegment { segment: "key" });
        }

        Ok(Self::from_parts(authority.to_string(), module, key))
    }

    /// The authority this address belongs to.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// The decoded module, if the address is module- or entry-scoped.
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// The decoded key, if the address is entry-scoped.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The granularity of this address.
    pub fn scope(&self) -> Scope<'_> {
        match (self.module.as_deref(), self.key.as_deref()) {
            (Some(module), Some(key)) => Scope::Entry { module, key },
            (Some(module), None) => Scope::Module(module),
            _ => Scope::Root,
        }
    }

    /// Returns `true` if this is the root address.
    pub fn is_root(&self) -> bool {
        self.module.is_none()
    }

    /// Returns `true` if this address selects exactly one entry.
    pub fn is_entry(&self) -> bool {
        self.key.is_some()
    }

    /// Returns `true` if an entry stored under `(module, key)` falls within
    /// this address.
    pub fn matches(&self, module: &str, key: &str) -> bool {
        match self.scope() {
            Scope::Root => true,
            Scope::Module(m) => m == module,
            Scope::Entry { module: m, key: k } => m == module && k == key,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}://{}", self.authority)?;
        if let Some(module) = &self.module {
            write!(f, "/{}", encode_segment(module))?;
        }
        if let Some(key) = &self.key {
            write!(f, "/{}", encode_segment(key))?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

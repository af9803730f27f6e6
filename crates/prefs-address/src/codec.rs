//! Building addresses from `(module, key)` pairs.
//!
//! Segment escaping rules:
//! - Bytes in the RFC 3986 unreserved set (`A-Z a-z 0-9 - . _ ~`) are kept
//! - Every other byte of the UTF-8 encoding becomes `%XX` (upper-case hex)
//! - Decoding accepts only unreserved bytes and well-formed `%XX` escapes, and
//!   the unescaped bytes must be valid UTF-8

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::address::Address;
use crate::error::{AddressError, Result};

/// Everything except the unreserved characters is escaped.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

/// Characters that are forbidden in an authority.
const FORBIDDEN_AUTHORITY_CHARS: &[char] = &['/', '?', '#', '%', '@'];

/// Escape one module or key segment.
///
/// # Examples
///
/// ```
/// use prefs_address::encode_segment;
///
/// assert_eq!(encode_segment("common"), "common");
/// assert_eq!(encode_segment("test/blubb"), "test%2Fblubb");
/// assert_eq!(encode_segment("test'blubb"), "test%27blubb");
/// ```
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Reverse [`encode_segment`].
pub fn decode_segment(segment: &str) -> Result<String> {
    let malformed = |reason: String| AddressError::Malformed {
        address: segment.to_string(),
        reason,
    };

    let bytes = segment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' {
            let hex = bytes.get(i + 1..i + 3).unwrap_or_default();
            if hex.len() != 2 || !hex.iter().all(u8::is_ascii_hexdigit) {
                return Err(malformed(format!("truncated or invalid escape at byte {i}")));
            }
            i += 3;
        } else if !is_unreserved(b) {
            return Err(malformed(format!(
                "unescaped character {:?} at byte {i}",
                segment[i..].chars().next().unwrap_or_default()
            )));
        } else {
            i += 1;
        }
    }

    percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| malformed(format!("escaped bytes are not UTF-8: {e}")))
}

/// Validate an authority, returning `Ok(())` if it can be embedded in an
/// address.
pub fn validate_authority(authority: &str) -> Result<()> {
    let invalid = |reason: String| AddressError::InvalidAuthority {
        authority: authority.to_string(),
        reason,
    };

    if authority.is_empty() {
        return Err(invalid("authority must not be empty".into()));
    }
    if let Some(ch) = authority
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_AUTHORITY_CHARS.contains(c))
    {
        return Err(invalid(format!("contains forbidden character: {ch:?}")));
    }
    Ok(())
}

/// Builds [`Address`]es under a single authority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressCodec {
    authority: String,
}

impl AddressCodec {
    /// Create a codec for `authority`.
    pub fn new(authority: impl Into<String>) -> Result<Self> {
        let authority = authority.into();
        validate_authority(&authority)?;
        Ok(Self { authority })
    }

    /// The authority every address from this codec carries.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Build an address at the granularity given by which parts are present.
    ///
    /// - `(None, None)` — the root address
    /// - `(Some(module), None)` — every entry of `module`
    /// - `(Some(module), Some(key))` — the single entry `(module, key)`
    /// - `(None, Some(key))` — rejected with [`AddressError::KeyWithoutModule`]
    pub fn encode(&self, module: Option<&str>, key: Option<&str>) -> Result<Address> {
        match (module, key) {
            (None, Some(key)) => Err(AddressError::KeyWithoutModule {
                key: key.to_string(),
            }),
            (Some(""), _) => Err(AddressError::EmptySegment { segment: "module" }),
            (_, Some("")) => Err(AddressError::EmptySegment { segment: "key" }),
            (module, key) => Ok(Address::from_parts(
                self.authority.clone(),
                module.map(str::to_string),
                key.map(str::to_string),
            )),
        }
    }

    /// The root address.
    pub fn root(&self) -> Address {
        Address::from_parts(self.authority.clone(), None, None)
    }

    /// The address of every entry of `module`.
    pub fn module(&self, module: &str) -> Result<Address> {
        self.encode(Some(module), None)
    }

    /// The address of the entry `(module, key)`.
    pub fn entry(&self, module: &str, key: &str) -> Result<Address> {
        self.encode(Some(module), Some(key))
    }

    /// Parse address text back into its parts.
    ///
    /// The authority is carried through as written; callers decide whether a
    /// foreign authority is acceptable.
    pub fn decode(&self, text: &str) -> Result<Address> {
        Address::parse(text)
    }
}

//! Validated node identifiers.

use std::borrow::Borrow;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ObspecError, Result};

// Letters, digits and the separators used by DCIDs such as
// `geoId/06`, `dc/base/USGSWaterUse`, `Count_Person` or `wikidataId/Q30`.
static DCID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-./:]*$").unwrap());

/// Identifier of a node in the knowledge graph (stat var, place, provenance).
///
/// Construction validates the identifier, so every map keyed by `Dcid` has a
/// known key domain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dcid(String);

impl Dcid {
    /// Validate and wrap an identifier.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if DCID_PATTERN.is_match(&value) {
            Ok(Self(value))
        } else {
            Err(ObspecError::InvalidDcid(value))
        }
    }

    /// Validate a list of identifiers, failing on the first bad one.
    pub fn parse_all<I, S>(values: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values.into_iter().map(Self::new).collect()
    }

    /// Wrap a literal identifier known to be valid.
    ///
    /// Pair with [`Dcid::is_valid_literal`] in a `const` assertion so the
    /// literal is checked at compile time.
    pub fn from_static(value: &'static str) -> Self {
        debug_assert!(Self::is_valid_literal(value), "invalid DCID literal {value}");
        Self(value.to_string())
    }

    /// Compile-time check matching the DCID pattern.
    pub const fn is_valid_literal(value: &str) -> bool {
        let bytes = value.as_bytes();
        if bytes.is_empty() || !bytes[0].is_ascii_alphanumeric() {
            return false;
        }
        let mut i = 1;
        while i < bytes.len() {
            let b = bytes[i];
            if !(b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'/' | b':')) {
                return false;
            }
            i += 1;
        }
        true
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Dcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Dcid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Dcid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Dcid {
    type Error = ObspecError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Dcid {
    type Error = ObspecError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Dcid> for String {
    fn from(value: Dcid) -> Self {
        value.0
    }
}

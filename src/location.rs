//! The `Location` identifier: a file path or crawl-time URI that owns a slice
//! of the inverted index's token stream.

use std::cmp::Ordering;
use std::fmt;

/// An opaque identifier for the origin of a token occurrence.
///
/// For files this is the textual form of the input path; for web pages it is
/// the seed-form URI with any `#fragment` stripped. Locations are compared
/// case-sensitively for identity (so two differently-cased paths referring to
/// the same case-sensitive filesystem entry remain distinct keys), but sort
/// case-insensitively for the tie-breaking order the search comparator uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Location(String);

impl Location {
    /// Wrap a raw location string. No validation is performed here — callers
    /// (the builder for paths, the crawler for URIs) are responsible for
    /// producing the canonical form spec.md §3 requires.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive ordering, used as the final tie-break key in the
    /// search comparator (spec.md §4.3).
    pub fn cmp_case_insensitive(&self, other: &Self) -> Ordering {
        self.0.to_lowercase().cmp(&other.0.to_lowercase())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Location {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::borrow::Borrow<str> for Location {
    fn borrow(&self) -> &str {
        &self.0
    }
}

//! Repository resource paths.
//!
//! A [`ResourcePath`] names one node in the repository tree, relative to the
//! repository's base path (e.g. `/lib/book1` for
//! `http://host/fcrepo/rest/lib/book1`). Paths are normalized on
//! construction: a single leading slash, no trailing slash, no empty or dot
//! segments. The root is `/`.
//!
//! # Example
//!
//! ```rust
//! use fin_core::ResourcePath;
//!
//! let path = ResourcePath::new("lib/book1/").unwrap();
//! assert_eq!(path.as_str(), "/lib/book1");
//! assert_eq!(path.parent().unwrap().as_str(), "/lib");
//!
//! let ancestors: Vec<_> = path.ancestors().map(|p| p.to_string()).collect();
//! assert_eq!(ancestors, vec!["/lib", "/"]);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A normalized, hierarchical repository path.
///
/// Every non-root path has exactly one parent, obtained by dropping the last
/// segment.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourcePath(String);

impl ResourcePath {
    /// Parse and normalize a path.
    ///
    /// A missing leading slash is added, repeated and trailing slashes are
    /// collapsed. Rejects `.`/`..` segments and query or fragment markers.
    pub fn new(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.contains(['?', '#']) {
            return Err(Error::invalid_path(
                input,
                "query and fragment markers are not allowed",
            ));
        }

        let mut normalized = String::with_capacity(trimmed.len() + 1);
        for segment in trimmed.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(Error::invalid_path(input, "dot segments are not allowed"));
            }
            normalized.push('/');
            normalized.push_str(segment);
        }

        if normalized.is_empty() {
            normalized.push('/');
        }
        Ok(Self(normalized))
    }

    /// The repository root, `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// The path as a string slice, always starting with `/`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path without its leading slash (empty for the root).
    ///
    /// This is the form used in `Slug` headers and in synthesized record paths.
    pub fn relative(&self) -> &str {
        &self.0[1..]
    }

    /// Whether this is the repository root.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Iterate over the path segments, shallowest first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Number of segments (zero for the root).
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The last segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.0.rsplit('/').next()
        }
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Iterate over proper ancestors, deepest first, ending at the root.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: self.parent(),
        }
    }

    /// Append one or more segments (`"a"` or `"a/b"`).
    pub fn join(&self, relative: &str) -> Result<Self> {
        Self::new(&format!("{}/{}", self.0, relative))
    }

    /// Whether `self` is `other` or lies beneath it.
    pub fn is_within(&self, other: &ResourcePath) -> bool {
        if other.is_root() || self == other {
            return true;
        }
        self.0.starts_with(&other.0) && self.0.as_bytes().get(other.0.len()) == Some(&b'/')
    }

    /// Whether `self` is a proper ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &ResourcePath) -> bool {
        self != other && other.is_within(self)
    }

    /// Map the path component of a URL onto a repository path.
    ///
    /// `url_path` is taken as it appears in the URL, percent-encoding
    /// included. `base_path` (e.g. `/fcrepo/rest`) is stripped from the
    /// front only at a segment boundary, so `/fcrepo/restless` is not under
    /// `/fcrepo/rest`. Returns `None` for paths outside the base.
    pub fn from_url_path(url_path: &str, base_path: &str) -> Option<Self> {
        let base = base_path.trim_end_matches('/');
        let rest = if base.is_empty() {
            url_path
        } else if url_path == base {
            "/"
        } else {
            url_path.strip_prefix(base).filter(|r| r.starts_with('/'))?
        };

        Self::new(rest).ok()
    }

    /// Build the absolute IRI for this path under `host` and `base_path`.
    pub fn to_iri(&self, host: &str, base_path: &str) -> String {
        format!(
            "{}{}{}",
            host.trim_end_matches('/'),
            base_path.trim_end_matches('/'),
            self.0
        )
    }
}

impl Default for ResourcePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourcePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ResourcePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ResourcePath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl TryFrom<&str> for ResourcePath {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ResourcePath> for String {
    fn from(path: ResourcePath) -> Self {
        path.0
    }
}

/// Iterator over a path's proper ancestors, deepest first.
#[derive(Debug, Clone)]
pub struct Ancestors {
    next: Option<ResourcePath>,
}

impl Iterator for Ancestors {
    type Item = ResourcePath;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Scope types and validation

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during scope operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("scope contains empty segment")]
    EmptySegment,

    #[error("scope depth {depth} exceeds maximum {max_depth}")]
    DepthExceeded { depth: usize, max_depth: usize },

    #[error("invalid scope segment: {segment} (allowed: alphanumeric, underscore, hyphen)")]
    InvalidSegment { segment: String },
}

/// A hierarchical policy scope
///
/// Scopes use dot notation for hierarchy (e.g., "acme.hr.uk"); the empty
/// scope is the root that every chain eventually falls back to.
///
/// # Examples
///
/// ```
/// use authz_index::Scope;
///
/// let scope = Scope::new("acme.hr.uk").unwrap();
/// assert_eq!(scope.as_str(), "acme.hr.uk");
/// assert_eq!(scope.segments().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    raw: String,
    segments: Vec<String>,
}

impl Scope {
    /// Creates a new Scope from a dot-separated string
    ///
    /// # Errors
    ///
    /// Returns `ScopeError::EmptySegment` if any segment between dots is
    /// empty. Charset and depth limits are validated by the resolver, which
    /// carries the configuration.
    pub fn new(scope: impl Into<String>) -> Result<Self, ScopeError> {
        let raw = scope.into();

        if raw.is_empty() {
            return Ok(Self {
                raw: String::new(),
                segments: Vec::new(),
            });
        }

        let segments: Vec<String> = raw.split('.').map(|s| s.to_string()).collect();

        for segment in &segments {
            if segment.is_empty() {
                return Err(ScopeError::EmptySegment);
            }
        }

        Ok(Self { raw, segments })
    }

    /// Returns the raw scope string
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the scope segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the depth (number of segments) of the scope
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Checks if this is the root (empty) scope
    pub fn is_root(&self) -> bool {
        self.raw.is_empty()
    }

    /// Checks if this scope is a prefix of another scope
    ///
    /// # Examples
    ///
    /// ```
    /// use authz_index::Scope;
    ///
    /// let parent = Scope::new("acme.hr").unwrap();
    /// let child = Scope::new("acme.hr.uk").unwrap();
    /// assert!(parent.is_prefix_of(&child));
    /// assert!(!child.is_prefix_of(&parent));
    /// ```
    pub fn is_prefix_of(&self, other: &Scope) -> bool {
        if self.segments.len() > other.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(other.segments.iter())
            .all(|(a, b)| a == b)
    }

    /// Returns the parent scope (one level up in the hierarchy)
    ///
    /// The parent of a single-segment scope is the root; the root has no
    /// parent.
    ///
    /// # Examples
    ///
    /// ```
    /// use authz_index::Scope;
    ///
    /// let scope = Scope::new("acme.hr.uk").unwrap();
    /// let parent = scope.parent().unwrap();
    /// assert_eq!(parent.as_str(), "acme.hr");
    /// ```
    pub fn parent(&self) -> Option<Scope> {
        if self.segments.is_empty() {
            return None;
        }

        let parent_segments = &self.segments[..self.segments.len() - 1];
        if parent_segments.is_empty() {
            return Some(Scope {
                raw: String::new(),
                segments: Vec::new(),
            });
        }

        let raw = parent_segments.join(".");
        Some(Scope {
            raw,
            segments: parent_segments.to_vec(),
        })
    }

    /// Validates a segment against the configured charset
    pub(crate) fn validate_segment(segment: &str, allowed_chars: &Regex) -> Result<(), ScopeError> {
        if segment.is_empty() {
            return Err(ScopeError::EmptySegment);
        }

        if !allowed_chars.is_match(segment) {
            return Err(ScopeError::InvalidSegment {
                segment: segment.to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.raw
    }
}

impl AsRef<str> for Scope {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_scope() {
        let scope = Scope::new("acme.hr.uk").unwrap();
        assert_eq!(scope.as_str(), "acme.hr.uk");
        assert_eq!(scope.segments(), &["acme", "hr", "uk"]);
        assert_eq!(scope.depth(), 3);
    }

    #[test]
    fn test_root_scope() {
        let scope = Scope::new("").unwrap();
        assert!(scope.is_root());
        assert_eq!(scope.depth(), 0);
    }

    #[test]
    fn test_invalid_empty_segment() {
        let result = Scope::new("acme..uk");
        assert!(matches!(result, Err(ScopeError::EmptySegment)));
    }

    #[test]
    fn test_is_prefix_of() {
        let parent = Scope::new("acme.hr").unwrap();
        let child = Scope::new("acme.hr.uk").unwrap();
        let other = Scope::new("acme.sales").unwrap();

        assert!(parent.is_prefix_of(&child));
        assert!(!child.is_prefix_of(&parent));
        assert!(!parent.is_prefix_of(&other));
    }

    #[test]
    fn test_parent() {
        let scope = Scope::new("acme.hr.uk").unwrap();
        let parent = scope.parent().unwrap();
        assert_eq!(parent.as_str(), "acme.hr");

        let grandparent = parent.parent().unwrap();
        assert_eq!(grandparent.as_str(), "acme");

        let root = grandparent.parent().unwrap();
        assert!(root.is_root());

        assert!(root.parent().is_none());
    }

    #[test]
    fn test_display() {
        let scope = Scope::new("acme.hr.uk").unwrap();
        assert_eq!(format!("{}", scope), "acme.hr.uk");
    }
}

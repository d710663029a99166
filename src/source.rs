//! Storage boundary: abstract read-only policy file trees
//!
//! The index never talks to a concrete transport. Whatever supplies the
//! policy files (local disk, archive, remote tree) implements [`Source`] and
//! owns its retry policy; the index only consumes the leaves the iterator
//! yields.

use std::collections::BTreeMap;

use crate::types::Policy;

/// A single leaf of a policy tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path of the file within the tree, used as the index key
    pub path: String,

    /// Raw file content, handed to the policy loader
    pub bytes: Vec<u8>,
}

/// An abstract hierarchical file enumeration
///
/// Implementations may materialize the tree up front or stream it lazily;
/// transient read failures surface as `Err` items and abort the build.
pub trait Source {
    /// Iterates over every leaf of the tree
    fn files(&self) -> Box<dyn Iterator<Item = anyhow::Result<SourceFile>> + '_>;
}

/// In-memory source backed by a sorted map
///
/// Traversal order is the lexicographic path order, which keeps build output
/// (and duplicate-definition reporting) deterministic. Used by tests and
/// small embedders.
///
/// # Examples
///
/// ```
/// use authz_index::{MemSource, Policy, Source};
///
/// let mut source = MemSource::new();
/// source.add_policy("derived_roles/common.json", &Policy::derived_roles("common_roles"));
/// assert_eq!(source.files().count(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemSource {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a raw file
    pub fn add_file(&mut self, path: impl Into<String>, bytes: Vec<u8>) -> &mut Self {
        self.files.insert(path.into(), bytes);
        self
    }

    /// Adds a policy serialized in the JSON document format understood by
    /// [`JsonPolicyLoader`](crate::loader::JsonPolicyLoader)
    pub fn add_policy(&mut self, path: impl Into<String>, policy: &Policy) -> &mut Self {
        let bytes = serde_json::to_vec(policy).expect("policy serialization cannot fail");
        self.add_file(path, bytes)
    }

    /// Removes a file, returning whether it was present
    pub fn remove_file(&mut self, path: &str) -> bool {
        self.files.remove(path).is_some()
    }

    /// Number of files in the tree
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the tree is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Source for MemSource {
    fn files(&self) -> Box<dyn Iterator<Item = anyhow::Result<SourceFile>> + '_> {
        Box::new(self.files.iter().map(|(path, bytes)| {
            Ok(SourceFile {
                path: path.clone(),
                bytes: bytes.clone(),
            })
        }))
    }
}

impl<S: Into<String>> FromIterator<(S, Policy)> for MemSource {
    fn from_iter<T: IntoIterator<Item = (S, Policy)>>(iter: T) -> Self {
        let mut source = Self::new();
        for (path, policy) in iter {
            source.add_policy(path, &policy);
        }
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_order_is_deterministic() {
        let mut source = MemSource::new();
        source.add_policy("b.json", &Policy::resource("b", ""));
        source.add_policy("a.json", &Policy::resource("a", ""));

        let paths: Vec<String> = source
            .files()
            .map(|f| f.unwrap().path)
            .collect();
        assert_eq!(paths, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_remove_file() {
        let mut source = MemSource::new();
        source.add_policy("a.json", &Policy::resource("a", ""));

        assert!(source.remove_file("a.json"));
        assert!(!source.remove_file("a.json"));
        assert!(source.is_empty());
    }
}

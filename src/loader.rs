//! Policy loading contract
//!
//! Parsing is an external concern: the index hands each file's raw bytes to a
//! [`PolicyLoader`] and treats the result as opaque. Per-file load failures
//! are collected into the aggregate build error instead of aborting the
//! build.

use anyhow::{bail, Context};

use crate::types::{Policy, PolicyKind};

/// Contract between the index and whatever parses policy documents
///
/// Implementations behave as pure functions of `(path, bytes)`.
pub trait PolicyLoader: Send + Sync {
    /// Parses one file into a policy definition
    fn load(&self, path: &str, bytes: &[u8]) -> anyhow::Result<Policy>;
}

/// Default loader for the JSON policy document format
///
/// Document shape:
///
/// ```json
/// {
///   "kind": "resourcePolicy",
///   "name": "leave_request",
///   "version": "default",
///   "scope": "acme.hr",
///   "importDerivedRoles": ["common_roles"]
/// }
/// ```
///
/// `version`, `scope` and `importDerivedRoles` are optional. Structural rules
/// enforced here: the name must be non-empty, derived-role sets neither
/// import nor carry a scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPolicyLoader;

impl JsonPolicyLoader {
    pub fn new() -> Self {
        Self
    }
}

impl PolicyLoader for JsonPolicyLoader {
    fn load(&self, path: &str, bytes: &[u8]) -> anyhow::Result<Policy> {
        let policy: Policy = serde_json::from_slice(bytes)
            .with_context(|| format!("failed to parse policy document {path}"))?;

        if policy.name.is_empty() {
            bail!("policy document {path} has an empty name");
        }

        if policy.kind == PolicyKind::DerivedRoles {
            if !policy.imports.is_empty() {
                bail!("derived-role set {path} declares imports; only resource and principal policies import");
            }
            if !policy.scope.is_empty() {
                bail!("derived-role set {path} declares a scope; derived-role sets are unscoped");
            }
        }

        Ok(policy)
    }
}

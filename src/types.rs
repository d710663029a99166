//! Core policy and index types

use serde::{Deserialize, Serialize};

use crate::namer::{self, ModuleId};

/// The kind of a policy definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicyKind {
    /// Rules for actions on a resource type
    ResourcePolicy,

    /// Rules attached to a specific principal
    PrincipalPolicy,

    /// A named, reusable set of role-derivation rules
    DerivedRoles,
}

/// An immutable parsed policy definition
///
/// Policies are produced by a [`PolicyLoader`](crate::loader::PolicyLoader)
/// and owned by the index; an update replaces the stored value, it never
/// mutates it in place.
///
/// # Examples
///
/// ```
/// use authz_index::{Policy, PolicyKind};
///
/// let policy = Policy::resource("leave_request", "acme.hr")
///     .with_imports(vec!["common_roles".to_string()]);
/// assert_eq!(policy.kind, PolicyKind::ResourcePolicy);
/// assert_eq!(policy.fqn(), "resource.leave_request.vdefault/acme.hr");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Definition kind
    pub kind: PolicyKind,

    /// Resource/principal name, or the derived-role set name
    pub name: String,

    /// Policy version; definitions with different versions are distinct
    #[serde(default = "default_version")]
    pub version: String,

    /// Dot-separated hierarchical scope, `""` = root/unscoped
    #[serde(default)]
    pub scope: String,

    /// Names of derived-role sets this policy imports
    ///
    /// Only resource and principal policies import.
    #[serde(default, rename = "importDerivedRoles")]
    pub imports: Vec<String>,
}

fn default_version() -> String {
    "default".to_string()
}

impl Policy {
    /// Creates a resource policy with the default version
    pub fn resource(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            kind: PolicyKind::ResourcePolicy,
            name: name.into(),
            version: default_version(),
            scope: scope.into(),
            imports: Vec::new(),
        }
    }

    /// Creates a principal policy with the default version
    pub fn principal(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            kind: PolicyKind::PrincipalPolicy,
            name: name.into(),
            version: default_version(),
            scope: scope.into(),
            imports: Vec::new(),
        }
    }

    /// Creates a derived-role set definition
    pub fn derived_roles(name: impl Into<String>) -> Self {
        Self {
            kind: PolicyKind::DerivedRoles,
            name: name.into(),
            version: default_version(),
            scope: String::new(),
            imports: Vec::new(),
        }
    }

    /// Replaces the declared imports
    pub fn with_imports(mut self, imports: Vec<String>) -> Self {
        self.imports = imports;
        self
    }

    /// Replaces the version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Returns the fully-qualified name of this definition
    pub fn fqn(&self) -> String {
        namer::fqn_at_scope(self.kind, &self.name, &self.version, &self.scope)
    }

    /// Returns the FQN this definition would have at another scope
    pub fn fqn_at_scope(&self, scope: &str) -> String {
        namer::fqn_at_scope(self.kind, &self.name, &self.version, scope)
    }

    /// Returns the module id of this definition
    pub fn module_id(&self) -> ModuleId {
        ModuleId::from_fqn(&self.fqn())
    }

    /// Whether this kind of policy participates in scope fallback chains
    pub fn is_scoped_kind(&self) -> bool {
        matches!(
            self.kind,
            PolicyKind::ResourcePolicy | PolicyKind::PrincipalPolicy
        )
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            kind: PolicyKind::ResourcePolicy,
            name: String::new(),
            version: default_version(),
            scope: String::new(),
            imports: Vec::new(),
        }
    }
}

/// Input to [`Index::add_or_update`](crate::index::Index::add_or_update)
///
/// The default value is deliberately invalid (empty file path, nameless
/// policy) and is rejected with
/// [`IndexError::InvalidEntry`](crate::error::IndexError::InvalidEntry).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    /// Source file path, the primary key within the index
    pub file: String,

    /// The parsed policy for that file
    pub policy: Policy,
}

impl Entry {
    /// Creates an entry from a file path and policy
    pub fn new(file: impl Into<String>, policy: Policy) -> Self {
        Self {
            file: file.into(),
            policy,
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        !self.file.is_empty() && !self.policy.name.is_empty()
    }
}

/// The kind of change a successful mutation applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// A policy was added or replaced
    AddOrUpdatePolicy,

    /// A policy was removed
    RemovePolicy,
}

/// Result of a successful mutation, consumed by cache-invalidation layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// What happened
    pub kind: EventKind,

    /// Module id of the affected policy
    pub policy_id: ModuleId,
}

impl Event {
    pub(crate) fn add_or_update(policy_id: ModuleId) -> Self {
        Self {
            kind: EventKind::AddOrUpdatePolicy,
            policy_id,
        }
    }

    pub(crate) fn remove(policy_id: ModuleId) -> Self {
        Self {
            kind: EventKind::RemovePolicy,
            policy_id,
        }
    }
}

/// Detached per-file snapshot returned by [`Index::inspect`](crate::index::Index::inspect)
///
/// Dependency and reference lists name file paths and are sorted, so snapshots
/// of observationally identical indexes compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// The stored policy
    pub policy: Policy,

    /// Files whose policies this file's policy depends on
    pub dependencies: Vec<String>,

    /// Files whose policies depend on this file's policy
    pub references: Vec<String>,
}

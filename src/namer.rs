//! Policy naming and module identity
//!
//! Every policy definition has a fully-qualified name (FQN) that encodes its
//! kind, name, version and scope. The graph never compares FQN strings on hot
//! paths; instead each FQN is hashed once into a [`ModuleId`] which acts as
//! the primary key everywhere.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::PolicyKind;

/// Stable 64-bit identifier derived from an FQN
///
/// The same FQN always yields the same id, so ids can be computed
/// independently by any component that knows the naming rules. A collision
/// between unrelated FQNs is a defect in the naming contract, not a runtime
/// condition.
///
/// # Examples
///
/// ```
/// use authz_index::namer::{resource_policy_fqn, ModuleId};
///
/// let fqn = resource_policy_fqn("leave_request", "default", "acme.hr");
/// assert_eq!(ModuleId::from_fqn(&fqn), ModuleId::from_fqn(&fqn));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(u64);

impl ModuleId {
    /// Derives the module id for an FQN
    pub fn from_fqn(fqn: &str) -> Self {
        let digest = blake3::hash(fqn.as_bytes());
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&digest.as_bytes()[..8]);
        Self(u64::from_le_bytes(buf))
    }

    /// Returns the raw 64-bit value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Builds the FQN of a resource policy
///
/// Format: `resource.<name>.v<version>` with `/<scope>` appended for scoped
/// definitions.
pub fn resource_policy_fqn(name: &str, version: &str, scope: &str) -> String {
    scoped_fqn(format!("resource.{name}.v{version}"), scope)
}

/// Builds the FQN of a principal policy
///
/// Format: `principal.<name>.v<version>` with `/<scope>` appended for scoped
/// definitions.
pub fn principal_policy_fqn(name: &str, version: &str, scope: &str) -> String {
    scoped_fqn(format!("principal.{name}.v{version}"), scope)
}

/// Builds the FQN of a derived-role set
///
/// Derived-role sets are neither scoped nor versioned.
pub fn derived_roles_fqn(name: &str) -> String {
    format!("derived_roles.{name}")
}

/// Builds the FQN a policy of the given kind would have at another scope
///
/// Used to locate ancestor definitions: the ancestor of
/// `resource.leave_request.vdefault/acme.hr` at scope `acme` is
/// `resource.leave_request.vdefault/acme`.
pub fn fqn_at_scope(kind: PolicyKind, name: &str, version: &str, scope: &str) -> String {
    match kind {
        PolicyKind::ResourcePolicy => resource_policy_fqn(name, version, scope),
        PolicyKind::PrincipalPolicy => principal_policy_fqn(name, version, scope),
        PolicyKind::DerivedRoles => derived_roles_fqn(name),
    }
}

fn scoped_fqn(base: String, scope: &str) -> String {
    if scope.is_empty() {
        base
    } else {
        format!("{base}/{scope}")
    }
}

//! # Policy Index (authz-index)
//!
//! Indexing core for a policy-based authorization engine, with support for:
//! - Full builds over an abstract policy file tree
//! - Incremental single-file additions, updates and deletions on a live graph
//! - Bidirectional dependency tracking between policies and derived-role sets
//! - Scoped policy hierarchies with ancestor-chain fallback resolution
//! - Aggregated structural error reporting (never first-error-only)
//! - Thread-safe concurrent access (multiple readers, single writer)
//!
//! ## Example
//!
//! ```rust
//! use authz_index::{Index, IndexConfig, JsonPolicyLoader, MemSource, Policy};
//!
//! let mut source = MemSource::new();
//! source.add_policy("derived_roles/common.json", &Policy::derived_roles("common_roles"));
//! source.add_policy(
//!     "resource_policies/leave.json",
//!     &Policy::resource("leave_request", "acme")
//!         .with_imports(vec!["common_roles".to_string()]),
//! );
//! source.add_policy(
//!     "resource_policies/leave_root.json",
//!     &Policy::resource("leave_request", ""),
//! );
//!
//! let index = Index::build(&source, &JsonPolicyLoader::new(), IndexConfig::default())?;
//!
//! let scoped = Policy::resource("leave_request", "acme").module_id();
//! let units = index.get_compilation_units(&[scoped])?;
//! assert_eq!(units[&scoped].ancestors().len(), 1);
//! # Ok::<(), authz_index::IndexError>(())
//! ```

pub mod error;
pub mod graph;
pub mod index;
pub mod loader;
pub mod namer;
pub mod scope;
pub mod source;
pub mod types;

pub use error::{IndexError, Result};
pub use index::{
    BuildError, CompilationUnit, DeletionPolicy, DuplicateDefinition, Index, IndexConfig,
    LoadFailure, MissingImport,
};
pub use loader::{JsonPolicyLoader, PolicyLoader};
pub use namer::ModuleId;
pub use scope::{CacheStats, Scope, ScopeConfig, ScopeError, ScopeResolver};
pub use source::{MemSource, Source, SourceFile};
pub use types::{Entry, Event, EventKind, IndexEntry, Policy, PolicyKind};

//! The policy index: the aggregate root of this crate
//!
//! The index owns every parsed definition, the dependency graph between
//! them, and the scope relationships needed for fallback resolution. It is
//! built once from a [`Source`] and then kept live through single-file
//! mutations while concurrent readers assemble compilation units.
//!
//! # Concurrency
//!
//! Multiple readers / single writer: queries take a read guard and run
//! concurrently; every mutation applies its whole edge update (stale edge
//! removal, new edges, reverse references) under one write guard, so readers
//! never observe half an update.
//!
//! # Example
//!
//! ```
//! use authz_index::{Index, IndexConfig, JsonPolicyLoader, MemSource, Policy};
//!
//! let mut source = MemSource::new();
//! source.add_policy("dr/common.json", &Policy::derived_roles("common_roles"));
//! source.add_policy(
//!     "rp/leave.json",
//!     &Policy::resource("leave_request", "").with_imports(vec!["common_roles".into()]),
//! );
//!
//! let index = Index::build(&source, &JsonPolicyLoader::new(), IndexConfig::default()).unwrap();
//! assert_eq!(index.files().len(), 2);
//! ```

mod builder;
mod errors;
mod unit;


pub use errors::{BuildError, DuplicateDefinition, LoadFailure, MissingImport};
pub use unit::CompilationUnit;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{IndexError, Result};
use crate::graph::DependencyGraph;
use crate::loader::PolicyLoader;
use crate::namer::{self, ModuleId};
use crate::scope::{ScopeConfig, ScopeResolver};
use crate::source::Source;
use crate::types::{Entry, Event, IndexEntry, Policy};

/// What `delete` does to a file other policies still depend on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletionPolicy {
    /// Fail the deletion with [`IndexError::FileReferenced`]
    #[default]
    RejectReferenced,

    /// Remove the file; referencing policies dangle until revalidated
    AllowDangling,
}

/// Index configuration
#[derive(Debug, Clone, Default)]
pub struct IndexConfig {
    /// Scope validation and ancestor-chain settings
    pub scope: ScopeConfig,

    /// Behavior of `delete` for still-referenced files
    pub deletion: DeletionPolicy,
}

/// Everything behind the write lock
#[derive(Debug, Default)]
pub(crate) struct IndexState {
    /// file path -> parsed policy
    pub(crate) entries: HashMap<String, Policy>,

    pub(crate) file_to_mod: HashMap<String, ModuleId>,
    pub(crate) mod_to_file: HashMap<ModuleId, String>,

    pub(crate) graph: DependencyGraph,
}

/// Shared handle to the policy index
///
/// Cloning is cheap and yields another handle to the same index; collaborators
/// each hold a handle rather than reaching into shared static state.
#[derive(Debug, Clone)]
pub struct Index {
    state: Arc<RwLock<IndexState>>,
    scopes: Arc<ScopeResolver>,
    deletion: DeletionPolicy,
}

impl Index {
    /// Creates an empty index that can be populated via `add_or_update`
    pub fn empty(config: IndexConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(IndexState::default())),
            scopes: Arc::new(ScopeResolver::new(config.scope)),
            deletion: config.deletion,
        }
    }

    /// Builds an index from every file in the source tree
    ///
    /// Structural problems (parse failures, duplicate definitions, missing
    /// imports, missing scope ancestors) are collected across the whole tree
    /// and returned together as [`IndexError::Build`]; the partially
    /// populated index travels inside the report for callers that can use a
    /// best-effort graph. Only source-read failures abort the walk.
    pub fn build(
        source: &dyn Source,
        loader: &dyn PolicyLoader,
        config: IndexConfig,
    ) -> Result<Self> {
        Self::build_inner(source, loader, config, None)
    }

    /// Builds an index, checking the cancellation token between files
    ///
    /// On cancellation returns [`IndexError::Cancelled`] and no index, not
    /// even a partial one.
    pub fn build_cancellable(
        source: &dyn Source,
        loader: &dyn PolicyLoader,
        config: IndexConfig,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        Self::build_inner(source, loader, config, Some(cancel))
    }

    fn build_inner(
        source: &dyn Source,
        loader: &dyn PolicyLoader,
        config: IndexConfig,
        cancel: Option<&CancellationToken>,
    ) -> Result<Self> {
        let scopes = Arc::new(ScopeResolver::new(config.scope));
        let (state, collector) = builder::build_state(source, loader, &scopes, cancel)?;

        let files = state.entries.len();
        let index = Self {
            state: Arc::new(RwLock::new(state)),
            scopes,
            deletion: config.deletion,
        };

        match collector.into_build_error(index.clone()) {
            Some(err) => {
                info!(files, problems = err.count(), "index built with problems");
                Err(IndexError::Build(err))
            }
            None => {
                info!(files, "index built");
                Ok(index)
            }
        }
    }

    /// Adds a new policy file or replaces an existing one
    ///
    /// Replacement removes the previous entry's outgoing edges (and their
    /// reverse references) before linking the new policy, so stale
    /// dependencies never linger. Imports that do not resolve against the
    /// current graph leave the edge absent without failing the call; the gap
    /// surfaces at the next full build or compilation-unit request.
    ///
    /// # Errors
    ///
    /// [`IndexError::InvalidEntry`] if the entry has an empty file path or a
    /// nameless policy; the index is not touched.
    pub fn add_or_update(&self, entry: Entry) -> Result<Event> {
        if !entry.is_valid() {
            return Err(IndexError::InvalidEntry);
        }

        let Entry { file, policy } = entry;
        let mod_id = policy.module_id();

        let mut state = self.state.write();

        // Replace, not merge: drop the previous incarnation's edges first.
        if let Some(old_id) = state.file_to_mod.remove(&file) {
            state.graph.remove_dependencies(old_id);
            state.mod_to_file.remove(&old_id);
        }

        if let Some(other) = state.mod_to_file.insert(mod_id, file.clone()) {
            // Last write wins, same as a rebuilt index would see.
            warn!(%file, %other, fqn = %policy.fqn(), "module id reassigned to a new file");
            state.file_to_mod.remove(&other);
            state.entries.remove(&other);
            state.graph.remove_dependencies(mod_id);
        }

        for import in &policy.imports {
            let dep_id = ModuleId::from_fqn(&namer::derived_roles_fqn(import));
            if state.mod_to_file.contains_key(&dep_id) {
                state.graph.add_edge(mod_id, dep_id);
            } else {
                warn!(%file, import = %import, "import does not resolve; edge left absent");
            }
        }

        state.file_to_mod.insert(file.clone(), mod_id);
        state.entries.insert(file.clone(), policy);

        debug!(%file, %mod_id, "policy added or updated");
        Ok(Event::add_or_update(mod_id))
    }

    /// Removes a policy file and its outgoing edges
    ///
    /// Under [`DeletionPolicy::RejectReferenced`] (the default) a file that
    /// other policies still depend on is not removed. Under
    /// [`DeletionPolicy::AllowDangling`] it is removed and the referencing
    /// files keep a dangling dependency edge, discoverable at the next full
    /// build or compilation-unit request.
    pub fn delete(&self, file: &str) -> Result<Event> {
        let mut state = self.state.write();

        let Some(&mod_id) = state.file_to_mod.get(file) else {
            return Err(IndexError::FileNotFound(file.to_string()));
        };

        let referenced_by = state
            .graph
            .dependents_of(mod_id)
            .map_or(0, |dependents| dependents.len());
        if referenced_by > 0 && self.deletion == DeletionPolicy::RejectReferenced {
            warn!(%file, count = referenced_by, "deletion rejected: file still referenced");
            return Err(IndexError::FileReferenced {
                file: file.to_string(),
                count: referenced_by,
            });
        }

        state.graph.remove_dependencies(mod_id);
        state.file_to_mod.remove(file);
        state.mod_to_file.remove(&mod_id);
        state.entries.remove(file);

        debug!(%file, %mod_id, dangling = referenced_by, "policy removed");
        Ok(Event::remove(mod_id))
    }

    /// Assembles compilation units for the given main modules
    ///
    /// # Errors
    ///
    /// [`IndexError::ModuleNotFound`] if any requested id does not resolve to
    /// an indexed file. A resolvable module whose transitive imports are
    /// incomplete still yields a unit; judging the gap is the compiler's
    /// concern.
    pub fn get_compilation_units(
        &self,
        mod_ids: &[ModuleId],
    ) -> Result<HashMap<ModuleId, CompilationUnit>> {
        let state = self.state.read();

        let mut units = HashMap::with_capacity(mod_ids.len());
        for &mod_id in mod_ids {
            units.insert(mod_id, Self::assemble_unit(&state, &self.scopes, mod_id)?);
        }

        Ok(units)
    }

    fn assemble_unit(
        state: &IndexState,
        scopes: &ScopeResolver,
        mod_id: ModuleId,
    ) -> Result<CompilationUnit> {
        let main_policy = state
            .mod_to_file
            .get(&mod_id)
            .and_then(|file| state.entries.get(file))
            .ok_or(IndexError::ModuleNotFound(mod_id))?;

        let mut queue = VecDeque::from([mod_id]);
        let mut seen = HashSet::from([mod_id]);
        let mut ancestors = Vec::new();

        // Ancestor definitions join the closure alongside the main policy so
        // their own imports are pulled in too.
        if main_policy.is_scoped_kind() && !main_policy.scope.is_empty() {
            for ancestor_scope in scopes.ancestor_scopes(&main_policy.scope)? {
                let ancestor_id =
                    ModuleId::from_fqn(&main_policy.fqn_at_scope(&ancestor_scope));
                if state.mod_to_file.contains_key(&ancestor_id) && seen.insert(ancestor_id) {
                    ancestors.push(ancestor_id);
                    queue.push_back(ancestor_id);
                }
            }
        }

        let mut definitions = IndexMap::new();
        while let Some(id) = queue.pop_front() {
            let Some(policy) = state
                .mod_to_file
                .get(&id)
                .and_then(|file| state.entries.get(file))
            else {
                // Dangling dependency: the unit stays usable without it.
                continue;
            };

            definitions.insert(id, policy.clone());
            if let Some(deps) = state.graph.dependencies_of(id) {
                for &dep in deps {
                    if seen.insert(dep) {
                        queue.push_back(dep);
                    }
                }
            }
        }

        Ok(CompilationUnit::new(mod_id, definitions, ancestors))
    }

    /// Returns, for each requested module, the modules that depend on it
    ///
    /// Meant for cache invalidation after an [`Event`]: the result includes
    /// dangling referents, so querying a just-deleted module still names the
    /// policies that must be recompiled. Unknown modules yield empty lists.
    pub fn get_dependents(&self, mod_ids: &[ModuleId]) -> HashMap<ModuleId, Vec<ModuleId>> {
        let state = self.state.read();

        mod_ids
            .iter()
            .map(|&mod_id| {
                let mut dependents: Vec<ModuleId> = state
                    .graph
                    .dependents_of(mod_id)
                    .map(|set| set.iter().copied().collect())
                    .unwrap_or_default();
                dependents.sort_unstable();
                (mod_id, dependents)
            })
            .collect()
    }

    /// Returns the sorted list of indexed file paths
    pub fn files(&self) -> Vec<String> {
        let state = self.state.read();
        let mut files: Vec<String> = state.entries.keys().cloned().collect();
        files.sort_unstable();
        files
    }

    /// Number of indexed files
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Whether the index holds no files
    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    /// Returns a fully detached snapshot of the file -> entry state
    ///
    /// Dependency and reference lists name file paths and are sorted;
    /// dangling edges (dependencies on modules with no backing file) are
    /// omitted since they have no path to report.
    pub fn inspect(&self) -> HashMap<String, IndexEntry> {
        let state = self.state.read();

        state
            .entries
            .iter()
            .map(|(file, policy)| {
                let mod_id = state.file_to_mod[file];
                let entry = IndexEntry {
                    policy: policy.clone(),
                    dependencies: Self::edge_files(&state, state.graph.dependencies_of(mod_id)),
                    references: Self::edge_files(&state, state.graph.dependents_of(mod_id)),
                };
                (file.clone(), entry)
            })
            .collect()
    }

    fn edge_files(state: &IndexState, edge: Option<&HashSet<ModuleId>>) -> Vec<String> {
        let mut files: Vec<String> = edge
            .into_iter()
            .flatten()
            .filter_map(|id| state.mod_to_file.get(id).cloned())
            .collect();
        files.sort_unstable();
        files
    }

    /// Releases all entries and edges, returning the index to its
    /// empty-build state; the handle may be reused
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        state.file_to_mod.clear();
        state.mod_to_file.clear();
        state.graph.clear();
        drop(state);

        self.scopes.clear_cache();
        debug!("index cleared");
    }

    /// Diagnostic hook: verifies the bidirectional edge invariant
    pub fn is_graph_consistent(&self) -> bool {
        self.state.read().graph.is_consistent()
    }
}

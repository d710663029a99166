use std::collections::{HashMap, HashSet};

use crate::namer::ModuleId;

#[cfg(test)]
mod tests;

/// Bidirectional dependency graph keyed by module id.
///
/// Two mirrored maps: `dependencies` holds forward edges (module -> what it
/// imports), `dependents` holds reverse edges (module -> who imports it).
/// Invariant: `b ∈ dependencies[a]` iff `a ∈ dependents[b]`.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    dependencies: HashMap<ModuleId, HashSet<ModuleId>>,
    dependents: HashMap<ModuleId, HashSet<ModuleId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `dependent` imports `dependency`, mirroring the reverse
    /// edge.
    pub fn add_edge(&mut self, dependent: ModuleId, dependency: ModuleId) {
        self.dependencies
            .entry(dependent)
            .or_default()
            .insert(dependency);
        self.dependents
            .entry(dependency)
            .or_default()
            .insert(dependent);
    }

    /// Drops every outgoing edge of `id` together with the mirrored reverse
    /// entries on the other side.
    ///
    /// Incoming edges are untouched: modules that import `id` keep their
    /// forward edge (and `id` keeps its dependents set), so a removed module
    /// dangles symmetrically until its importers are revalidated.
    pub fn remove_dependencies(&mut self, id: ModuleId) {
        if let Some(deps) = self.dependencies.remove(&id) {
            for dep in deps {
                if let Some(rev) = self.dependents.get_mut(&dep) {
                    rev.remove(&id);
                    if rev.is_empty() {
                        self.dependents.remove(&dep);
                    }
                }
            }
        }
    }

    pub fn dependencies_of(&self, id: ModuleId) -> Option<&HashSet<ModuleId>> {
        self.dependencies.get(&id)
    }

    pub fn dependents_of(&self, id: ModuleId) -> Option<&HashSet<ModuleId>> {
        self.dependents.get(&id)
    }

    pub fn clear(&mut self) {
        self.dependencies.clear();
        self.dependents.clear();
    }

    /// Verifies the bidirectional invariant. Diagnostic hook for tests.
    pub fn is_consistent(&self) -> bool {
        for (dependent, deps) in &self.dependencies {
            for dep in deps {
                let mirrored = self
                    .dependents
                    .get(dep)
                    .is_some_and(|rev| rev.contains(dependent));
                if !mirrored {
                    return false;
                }
            }
        }

        for (dependency, revs) in &self.dependents {
            for rev in revs {
                let mirrored = self
                    .dependencies
                    .get(rev)
                    .is_some_and(|deps| deps.contains(dependency));
                if !mirrored {
                    return false;
                }
            }
        }

        true
    }
}

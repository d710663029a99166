//! Compilation units served to the policy compiler

use indexmap::IndexMap;

use crate::namer::ModuleId;
use crate::types::Policy;

/// Everything the compiler needs to compile one main policy
///
/// A read-only view assembled on demand: the main definition, the transitive
/// closure of its imports, and (for scoped policies) every existing
/// ancestor-scope definition of the same resource/principal name, closed over
/// their imports as well.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    mod_id: ModuleId,
    definitions: IndexMap<ModuleId, Policy>,
    ancestors: Vec<ModuleId>,
}

impl CompilationUnit {
    pub(crate) fn new(
        mod_id: ModuleId,
        definitions: IndexMap<ModuleId, Policy>,
        ancestors: Vec<ModuleId>,
    ) -> Self {
        Self {
            mod_id,
            definitions,
            ancestors,
        }
    }

    /// Module id of the main policy
    pub fn mod_id(&self) -> ModuleId {
        self.mod_id
    }

    /// The main policy definition
    pub fn main_policy(&self) -> Option<&Policy> {
        self.definitions.get(&self.mod_id)
    }

    /// All definitions in the unit, main policy first
    pub fn definitions(&self) -> &IndexMap<ModuleId, Policy> {
        &self.definitions
    }

    /// Ancestor-scope module ids, most specific first
    ///
    /// This is the order the decision engine walks during fallback
    /// resolution. Only ancestors with a backing definition appear.
    pub fn ancestors(&self) -> &[ModuleId] {
        &self.ancestors
    }
}

//! Full index builds
//!
//! A build walks the whole source tree in three passes: load every file,
//! link declared imports, then verify scope ancestor chains. Structural
//! problems go to the collector; only source-read failures and cancellation
//! abort the build.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::errors::ErrorCollector;
use super::IndexState;
use crate::error::{IndexError, Result};
use crate::loader::PolicyLoader;
use crate::namer::{self, ModuleId};
use crate::scope::ScopeResolver;
use crate::source::Source;

pub(crate) fn build_state(
    source: &dyn Source,
    loader: &dyn PolicyLoader,
    scopes: &ScopeResolver,
    cancel: Option<&CancellationToken>,
) -> Result<(IndexState, ErrorCollector)> {
    let mut state = IndexState::default();
    let mut collector = ErrorCollector::default();

    // Load pass: parse every file and claim its module id. The first file to
    // claim an FQN wins; later claimants are reported as duplicates.
    for file in source.files() {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(IndexError::Cancelled);
            }
        }

        let file = file.map_err(IndexError::Source)?;

        let policy = match loader.load(&file.path, &file.bytes) {
            Ok(policy) => policy,
            Err(err) => {
                collector.load_failure(&file.path, &err);
                continue;
            }
        };

        if let Err(err) = scopes.validate_scope(&policy.scope) {
            collector.load_failure(&file.path, &anyhow::Error::new(err));
            continue;
        }

        let fqn = policy.fqn();
        let mod_id = ModuleId::from_fqn(&fqn);
        if let Some(other) = state.mod_to_file.get(&mod_id) {
            collector.duplicate_definition(fqn, &file.path, other);
            continue;
        }

        debug!(file = %file.path, fqn = %fqn, "indexed policy");
        state.entries.insert(file.path.clone(), policy);
        state.file_to_mod.insert(file.path.clone(), mod_id);
        state.mod_to_file.insert(mod_id, file.path);
    }

    // Link pass: resolve declared imports now that every definition is known.
    for (file, policy) in &state.entries {
        let mod_id = state.file_to_mod[file];
        for import in &policy.imports {
            let dep_fqn = namer::derived_roles_fqn(import);
            let dep_id = ModuleId::from_fqn(&dep_fqn);
            if state.mod_to_file.contains_key(&dep_id) {
                state.graph.add_edge(mod_id, dep_id);
            } else {
                collector.missing_import(dep_fqn, file);
            }
        }
    }

    // Scope pass: every ancestor level of a scoped definition must be backed
    // by a definition of the same name and version.
    for (file, policy) in &state.entries {
        if !policy.is_scoped_kind() || policy.scope.is_empty() {
            continue;
        }

        // Scope already validated during the load pass
        let Ok(ancestors) = scopes.ancestor_scopes(&policy.scope) else {
            continue;
        };

        for ancestor in ancestors {
            // A missing root definition is only a problem when configured so
            if ancestor.is_empty() && !scopes.config().require_root_scope {
                continue;
            }

            let fqn = policy.fqn_at_scope(&ancestor);
            if !state.mod_to_file.contains_key(&ModuleId::from_fqn(&fqn)) {
                debug!(file = %file, ancestor = %fqn, "missing scope ancestor");
                collector.missing_scope(fqn);
            }
        }
    }

    Ok((state, collector))
}

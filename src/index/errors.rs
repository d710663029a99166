//! Aggregated build diagnostics
//!
//! Structural problems never abort a build: every stage appends to an
//! [`ErrorCollector`] and the top level converts a non-empty collector into
//! one [`BuildError`] so an operator can fix everything in a single pass.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::Index;

/// Two files defining the same fully-qualified name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateDefinition {
    /// The FQN both files claim
    pub fqn: String,

    /// The file whose definition was rejected
    pub file: String,

    /// The file that defined the FQN first
    pub other_file: String,
}

/// An import that resolves to no loaded definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingImport {
    /// FQN of the definition the import points at
    pub imported: String,

    /// The file declaring the import
    pub importing_file: String,
}

/// A file the policy loader could not parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadFailure {
    pub file: String,
    pub error: String,
}

/// Aggregate report of every structural problem found in one build pass
///
/// Serializes to the diagnostics shape consumed by CLI/JSON tooling.
/// `missing_scopes` is deduplicated and sorted so reports are deterministic.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildError {
    pub duplicate_definitions: Vec<DuplicateDefinition>,
    pub missing_imports: Vec<MissingImport>,
    pub missing_scopes: Vec<String>,
    pub load_failures: Vec<LoadFailure>,

    /// The best-effort index populated by the same build pass
    ///
    /// Callers decide whether a partially linked index is usable.
    #[serde(skip)]
    partial: Option<Index>,
}

impl BuildError {
    /// Total number of problems in the report
    pub fn count(&self) -> usize {
        self.duplicate_definitions.len()
            + self.missing_imports.len()
            + self.missing_scopes.len()
            + self.load_failures.len()
    }

    /// Borrows the partially populated index
    pub fn partial_index(&self) -> Option<&Index> {
        self.partial.as_ref()
    }

    /// Consumes the report, returning the partially populated index
    pub fn into_partial_index(self) -> Option<Index> {
        self.partial
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index build failed: {} duplicate definitions, {} missing imports, {} missing scopes, {} load failures",
            self.duplicate_definitions.len(),
            self.missing_imports.len(),
            self.missing_scopes.len(),
            self.load_failures.len(),
        )
    }
}

impl std::error::Error for BuildError {}

/// Problem collector threaded through the build pass
#[derive(Debug, Default)]
pub(crate) struct ErrorCollector {
    duplicates: Vec<DuplicateDefinition>,
    missing_imports: Vec<MissingImport>,
    missing_scopes: BTreeSet<String>,
    load_failures: Vec<LoadFailure>,
}

impl ErrorCollector {
    pub(crate) fn is_empty(&self) -> bool {
        self.duplicates.is_empty()
            && self.missing_imports.is_empty()
            && self.missing_scopes.is_empty()
            && self.load_failures.is_empty()
    }

    pub(crate) fn duplicate_definition(
        &mut self,
        fqn: impl Into<String>,
        file: impl Into<String>,
        other_file: impl Into<String>,
    ) {
        self.duplicates.push(DuplicateDefinition {
            fqn: fqn.into(),
            file: file.into(),
            other_file: other_file.into(),
        });
    }

    pub(crate) fn missing_import(
        &mut self,
        imported: impl Into<String>,
        importing_file: impl Into<String>,
    ) {
        self.missing_imports.push(MissingImport {
            imported: imported.into(),
            importing_file: importing_file.into(),
        });
    }

    pub(crate) fn missing_scope(&mut self, fqn: impl Into<String>) {
        self.missing_scopes.insert(fqn.into());
    }

    pub(crate) fn load_failure(&mut self, file: impl Into<String>, error: &anyhow::Error) {
        self.load_failures.push(LoadFailure {
            file: file.into(),
            error: format!("{error:#}"),
        });
    }

    /// Converts a non-empty collector into the aggregate error, attaching the
    /// partially populated index
    pub(crate) fn into_build_error(self, partial: Index) -> Option<Box<BuildError>> {
        if self.is_empty() {
            return None;
        }

        Some(Box::new(BuildError {
            duplicate_definitions: self.duplicates,
            missing_imports: self.missing_imports,
            missing_scopes: self.missing_scopes.into_iter().collect(),
            load_failures: self.load_failures,
            partial: Some(partial),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_scopes_deduplicated_and_sorted() {
        let mut collector = ErrorCollector::default();
        collector.missing_scope("resource.x.vdefault/b");
        collector.missing_scope("resource.x.vdefault/a");
        collector.missing_scope("resource.x.vdefault/b");

        let err = collector
            .into_build_error(Index::empty(Default::default()))
            .unwrap();
        assert_eq!(
            err.missing_scopes,
            vec!["resource.x.vdefault/a", "resource.x.vdefault/b"]
        );
    }

    #[test]
    fn test_empty_collector_yields_no_error() {
        let collector = ErrorCollector::default();
        assert!(collector
            .into_build_error(Index::empty(Default::default()))
            .is_none());
    }

    #[test]
    fn test_report_serialization_shape() {
        let mut collector = ErrorCollector::default();
        collector.duplicate_definition("resource.a.vdefault", "b.json", "a.json");
        collector.missing_import("derived_roles.ghost", "a.json");
        collector.missing_scope("resource.a.vdefault/acme");

        let err = collector
            .into_build_error(Index::empty(Default::default()))
            .unwrap();
        let json = serde_json::to_value(&*err).unwrap();

        assert_eq!(json["duplicateDefinitions"][0]["fqn"], "resource.a.vdefault");
        assert_eq!(json["missingImports"][0]["imported"], "derived_roles.ghost");
        assert_eq!(json["missingScopes"][0], "resource.a.vdefault/acme");
        assert_eq!(json["loadFailures"].as_array().unwrap().len(), 0);
    }
}

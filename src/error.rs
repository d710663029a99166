//! Error types for the policy index

use thiserror::Error;

use crate::index::BuildError;
use crate::namer::ModuleId;
use crate::scope::ScopeError;

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors surfaced by index operations
///
/// Three classes: caller-contract violations (`InvalidEntry`, `FileNotFound`,
/// `FileReferenced`), aggregated structural problems (`Build`), and per-call
/// lookup failures (`ModuleNotFound`). Structural problems never
/// short-circuit a build; everything else fails fast without mutating state.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The entry passed to `add_or_update` is missing its file path or policy
    #[error("invalid entry: file path and policy are both required")]
    InvalidEntry,

    /// The file named in a mutation is not part of the index
    #[error("file {0} is not present in the index")]
    FileNotFound(String),

    /// Deletion was rejected because other policies still depend on the file
    #[error("file {file} is still referenced by {count} other policies")]
    FileReferenced { file: String, count: usize },

    /// A compilation unit was requested for an unknown module
    #[error("module {0} is not present in the index")]
    ModuleNotFound(ModuleId),

    /// The caller cancelled a build in progress
    #[error("index build cancelled")]
    Cancelled,

    /// Reading the policy source failed
    #[error("failed to read policy source")]
    Source(#[source] anyhow::Error),

    /// Scope validation failed
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// Structural problems collected during a build
    #[error(transparent)]
    Build(#[from] Box<BuildError>),
}

impl IndexError {
    /// Returns the aggregated build report, if this is a build error
    pub fn as_build_error(&self) -> Option<&BuildError> {
        match self {
            IndexError::Build(err) => Some(err),
            _ => None,
        }
    }

    /// Consumes the error, returning the aggregated build report if present
    pub fn into_build_error(self) -> Option<Box<BuildError>> {
        match self {
            IndexError::Build(err) => Some(err),
            _ => None,
        }
    }
}

//! Error types for store construction, registration, commit and dispatch.

use thiserror::Error;

/// Errors returned by store operations.
///
/// Structural errors (`InvalidPath`, `ModuleInstall`) abort the construction
/// or registration call that produced them. Lookup misses (`UnknownMutation`,
/// `UnknownAction`, `UnknownGetter`) fail only the single call and leave the
/// store usable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// `commit` named a mutation type with no registered handler.
    #[error("unknown mutation type: {0}")]
    UnknownMutation(String),

    /// `dispatch` named an action type with no registered handler.
    #[error("unknown action type: {0}")]
    UnknownAction(String),

    /// No getter is registered under this fully-qualified name.
    #[error("unknown getter: {0}")]
    UnknownGetter(String),

    /// A module path does not address a valid location in the module tree.
    #[error("invalid module path [{}]: {reason}", .path.join("/"))]
    InvalidPath { path: Vec<String>, reason: String },

    /// The module tree could not be grafted onto the live state.
    #[error("cannot install module [{}]: {reason}", .path.join("/"))]
    ModuleInstall { path: Vec<String>, reason: String },

    /// A mutation's module state is no longer present in the state tree.
    #[error("no state at [{}]", .path.join("/"))]
    StateNotFound { path: Vec<String> },

    /// Failure reported by an action handler.
    #[error("action failed: {0}")]
    Action(String),
}

impl StoreError {
    pub(crate) fn invalid_path(path: &[String], reason: impl Into<String>) -> Self {
        StoreError::InvalidPath {
            path: path.to_vec(),
            reason: reason.into(),
        }
    }

    pub(crate) fn install(path: &[String], reason: impl Into<String>) -> Self {
        StoreError::ModuleInstall {
            path: path.to_vec(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

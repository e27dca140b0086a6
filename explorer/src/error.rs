//! Error types for tree access and selection.

use thiserror::Error;

use crate::core::level::{Level, ViewMode};

/// Failures reported by a [`crate::tree::TreeAccessor`].
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("invalid path segment {segment:?}")]
    InvalidSegment { segment: String },

    /// The prefix does not denote an existing directory-like node.
    #[error("node not found: {path}")]
    NotFound { path: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Rejected selection transitions. A rejected call never changes state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("cannot use {level}: {missing} is not selected")]
    ShallowerUnset { level: Level, missing: Level },

    #[error("{value:?} is not an available {level}")]
    NotAnOption { level: Level, value: String },

    /// The value could never name a directory below its parent.
    #[error("{value:?} is not a valid {level} name")]
    InvalidSegment { level: Level, value: String },

    #[error("selection is incomplete: {missing} is not selected")]
    Incomplete { missing: Level },

    #[error("operation requires {expected} view, selection is in {actual} view")]
    ViewMismatch { expected: ViewMode, actual: ViewMode },
}

impl TreeError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

//! Structural error types.
//!
//! Raised while building or querying the registry tree. These are never
//! produced on the hot path, so they carry owned names and paths.

use crate::common::ErrorSeverity;

/// Registry construction and lookup errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// A child registry or variable with this name already exists under the node
    #[error("'{name}' already exists in namespace '{namespace}'")]
    DuplicateName {
        /// Namespace of the node where the clash happened
        namespace: String,
        /// Clashing name
        name: String,
    },

    /// Path does not resolve to a registry or variable
    #[error("nothing found at '{path}'")]
    NotFound {
        /// Requested path
        path: String,
    },

    /// Path resolves, but to the wrong kind of entry
    #[error("'{path}' is not a {expected}")]
    WrongEntry {
        /// Requested path
        path: String,
        /// What the caller asked for
        expected: &'static str,
    },

    /// Name is empty or contains a reserved character
    #[error("illegal name '{name}': {reason}")]
    IllegalName {
        /// Offending name
        name: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Empty lookup path
    #[error("empty path")]
    EmptyPath,

    /// Bounds are NaN or have `min > max`
    #[error("invalid bounds [{min}, {max}] for '{name}'")]
    InvalidBounds {
        /// Variable name
        name: String,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Variable kind is not in the registry's allowed set
    #[error("kind {kind} is not allowed for '{name}'")]
    KindNotAllowed {
        /// Variable name
        name: String,
        /// Rejected kind
        kind: &'static str,
    },

    /// Variable spec is inconsistent (for example an enum without constants)
    #[error("invalid definition for '{name}': {reason}")]
    InvalidDefinition {
        /// Variable name
        name: String,
        /// What is wrong with it
        reason: &'static str,
    },
}

impl RegistryError {
    /// Create a duplicate name error.
    pub fn duplicate(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        RegistryError::DuplicateName {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        RegistryError::NotFound { path: path.into() }
    }

    /// Create an illegal name error.
    pub fn illegal_name(name: impl Into<String>, reason: &'static str) -> Self {
        RegistryError::IllegalName {
            name: name.into(),
            reason,
        }
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RegistryError::NotFound { .. }
            | RegistryError::WrongEntry { .. }
            | RegistryError::EmptyPath => ErrorSeverity::Warning,
            RegistryError::DuplicateName { .. }
            | RegistryError::IllegalName { .. }
            | RegistryError::InvalidBounds { .. }
            | RegistryError::KindNotAllowed { .. }
            | RegistryError::InvalidDefinition { .. } => ErrorSeverity::Error,
        }
    }

    /// Check if this is a lookup miss rather than a structural conflict.
    pub fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            RegistryError::NotFound { .. } | RegistryError::WrongEntry { .. }
        )
    }
}

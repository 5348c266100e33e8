//! Serializable snapshot of a registry's structure.
//!
//! This is the read-only view handed to persistence collaborators. It fixes
//! no file format; callers serialize it with whatever serde backend they use.

use serde::{Deserialize, Serialize};

use crate::value::{Bounds, BoundsPolicy, VariableKind};
use crate::variable::Variable;

/// One variable in a [`RegistrySchema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSchema {
    /// Full dotted path
    pub path: String,
    /// Variable kind
    pub kind: VariableKind,
    /// Bounds for numeric kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    /// Out-of-bounds policy
    pub policy: BoundsPolicy,
    /// Enum constant names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_constants: Vec<String>,
    /// Free-text description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl VariableSchema {
    /// Describe one variable.
    pub fn of(variable: &Variable) -> Self {
        Self {
            path: variable.full_name(),
            kind: variable.kind(),
            bounds: variable.bounds(),
            policy: variable.policy(),
            enum_constants: variable.enum_constants().to_vec(),
            description: variable.description().to_owned(),
        }
    }
}

/// Depth-first list of every variable under a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySchema {
    /// Namespace of the registry the schema was taken from
    pub root: String,
    /// Variables in traversal order
    pub variables: Vec<VariableSchema>,
}

impl RegistrySchema {
    /// Look up a variable by full path.
    pub fn get(&self, path: &str) -> Option<&VariableSchema> {
        self.variables.iter().find(|v| v.path == path)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// True if the registry had no variables.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

//! Hierarchical registry of real-time variables
//!
//! This crate provides the live half of the rtvars substrate: a tree of
//! namespaces that owns named, typed scalar variables.
//!
//! # Overview
//!
//! - **Variable**: one scalar of a fixed [`VariableKind`], stored in an atomic
//!   word, with optional bounds and synchronous change listeners
//! - **Registry**: a node that owns child registries and variables, enforces
//!   name uniqueness and resolves dotted paths
//! - **Schema**: a serializable `(path, kind, bounds)` listing for persistence
//!
//! # RT Safety
//!
//! - [`Variable::get`] is lock-free and never fails
//! - [`Variable::set`] never allocates; it only locks when listeners exist
//! - Registry construction and lookup allocate and are setup-time operations
//!
//! # Example
//!
//! ```
//! use rtvars_registry::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut root = Registry::new("root")?;
//! let position = root.create_child("joint1")?.register(
//!     VariableSpec::double("position")
//!         .with_bounds(-std::f64::consts::PI, std::f64::consts::PI),
//! )?;
//!
//! // Clamp is the default policy.
//! position.set_double(4.0)?;
//! assert_eq!(position.get_double(), Some(std::f64::consts::PI));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod iter;
pub mod listener;
pub mod name;
pub mod prelude;
pub mod registry;
pub mod schema;
pub mod value;
pub mod variable;

pub use listener::ListenerHandle;
pub use name::{ILLEGAL_CHARACTERS, Namespace, SEPARATOR, validate_name};
pub use registry::{Entry, Registry, RegistryOptions};
pub use schema::{RegistrySchema, VariableSchema};
pub use value::{Bounds, BoundsPolicy, VariableKind, VariableValue};
pub use variable::{Variable, VariableHandle, VariableSpec, WriterClaim};

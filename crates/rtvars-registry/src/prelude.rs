//! Prelude for the registry crate.
//!
//! ```
//! use rtvars_registry::prelude::*;
//!
//! # fn main() -> Result<(), RegistryError> {
//! let mut root = Registry::new("robot")?;
//! let gain = root.register(VariableSpec::double("gain").with_initial(0.5))?;
//! assert_eq!(gain.get(), VariableValue::Double(0.5));
//! # Ok(())
//! # }
//! ```

pub use crate::listener::ListenerHandle;
pub use crate::name::{Namespace, validate_name};
pub use crate::registry::{Entry, Registry, RegistryOptions};
pub use crate::schema::{RegistrySchema, VariableSchema};
pub use crate::value::{Bounds, BoundsPolicy, VariableKind, VariableValue};
pub use crate::variable::{Variable, VariableHandle, VariableSpec, WriterClaim};
pub use rtvars_errors::{RegistryError, VariableError};

//! Prelude module for convenient error handling imports.
//!
//! ```
//! use rtvars_errors::prelude::*;
//!
//! fn lookup(path: &str) -> Result<()> {
//!     if path.is_empty() {
//!         return Err(RegistryError::EmptyPath.into());
//!     }
//!     Ok(())
//! }
//!
//! assert!(lookup("").is_err());
//! ```

pub use crate::{
    RTResult, Result,
    common::{ErrorCategory, ErrorContext, ErrorSeverity, ResultExt, RtVarsError},
    registry::RegistryError,
    rt::{BufferError, FilterError, VariableError},
};

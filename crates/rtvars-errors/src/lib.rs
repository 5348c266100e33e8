//! Error types for rtvars
//!
//! This crate provides the error taxonomy shared by the registry, the history
//! buffer and the filter library. Errors are split along the same line as the
//! code that raises them: the real-time hot path (`set`, `tick`, `update`) and
//! the structural, non-RT path (registration, lookup, configuration).
//!
//! # Architecture
//!
//! - [`common`]: Top-level error type, categories, severities and context helpers
//! - [`rt`]: Hot-path errors for variables, the history buffer and filters
//! - [`registry`]: Structural errors raised while building or querying the registry tree
//!
//! # RT Safety
//!
//! Hot-path error types are designed for use on the control-loop thread:
//! - `Copy` semantics, no heap allocations
//! - Fixed numeric codes for cheap reporting
//! - Constructing or returning one never formats a string
//!
//! # Example
//!
//! ```
//! use rtvars_errors::prelude::*;
//!
//! fn check_step(dt: f64) -> RTResult<f64, FilterError> {
//!     if dt <= 0.0 || !dt.is_finite() {
//!         return Err(FilterError::InvalidTimestep { dt });
//!     }
//!     Ok(dt)
//! }
//!
//! assert!(check_step(0.0).is_err());
//! let err: RtVarsError = FilterError::InvalidTimestep { dt: -1.0 }.into();
//! assert_eq!(err.category(), ErrorCategory::Filter);
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod common;
pub mod prelude;
pub mod registry;
pub mod rt;

pub use common::{ErrorCategory, ErrorContext, ErrorSeverity, ResultExt, RtVarsError};
pub use registry::RegistryError;
pub use rt::{BufferError, FilterError, VariableError};

/// A specialized `Result` type for rtvars operations.
pub type Result<T> = std::result::Result<T, RtVarsError>;

/// A specialized `Result` type for hot-path operations.
pub type RTResult<T = (), E = VariableError> = std::result::Result<T, E>;

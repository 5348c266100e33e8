//! Common error types and utilities used across all rtvars crates.
//!
//! This module provides the top-level error enum that can wrap all sub-errors,
//! along with error classification and severity levels.

use core::fmt;

use crate::{BufferError, FilterError, RegistryError, VariableError};

/// Top-level error type that can wrap all rtvars sub-errors.
#[derive(Debug, thiserror::Error)]
pub enum RtVarsError {
    /// Variable write and listener errors
    #[error("Variable error: {0}")]
    Variable(#[from] VariableError),

    /// Registry structure and lookup errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// History buffer errors
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// Filter errors
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with a message
    #[error("{0}")]
    Other(String),

    /// Error annotated with the operation that raised it
    #[error("{context}")]
    Context {
        /// What was being attempted
        context: ErrorContext,
        /// The underlying error
        #[source]
        source: Box<RtVarsError>,
    },
}

impl RtVarsError {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            RtVarsError::Variable(_) => ErrorCategory::Variable,
            RtVarsError::Registry(_) => ErrorCategory::Registry,
            RtVarsError::Buffer(_) => ErrorCategory::Buffer,
            RtVarsError::Filter(_) => ErrorCategory::Filter,
            RtVarsError::Io(_) => ErrorCategory::IO,
            RtVarsError::Config(_) => ErrorCategory::Config,
            RtVarsError::Other(_) => ErrorCategory::Other,
            RtVarsError::Context { source, .. } => source.category(),
        }
    }

    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RtVarsError::Variable(e) => e.severity(),
            RtVarsError::Registry(e) => e.severity(),
            RtVarsError::Buffer(e) => e.severity(),
            RtVarsError::Filter(e) => e.severity(),
            RtVarsError::Io(_) => ErrorSeverity::Error,
            RtVarsError::Config(_) => ErrorSeverity::Error,
            RtVarsError::Other(_) => ErrorSeverity::Error,
            RtVarsError::Context { source, .. } => source.severity(),
        }
    }

    /// Check if this error is recoverable.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Critical
    }

    /// Create a configuration error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        RtVarsError::Config(msg.into())
    }

    /// Create a generic error with a message.
    pub fn other(msg: impl Into<String>) -> Self {
        RtVarsError::Other(msg.into())
    }

    /// Innermost error beneath any context layers.
    pub fn root_cause(&self) -> &RtVarsError {
        match self {
            RtVarsError::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<std::io::Error> for RtVarsError {
    fn from(e: std::io::Error) -> Self {
        RtVarsError::Io(e)
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Variable write and listener errors
    Variable = 0,
    /// Registry structure and lookup errors
    Registry = 1,
    /// History buffer errors
    Buffer = 2,
    /// Filter errors
    Filter = 3,
    /// Configuration errors
    Config = 4,
    /// I/O errors
    IO = 5,
    /// Other errors
    Other = 255,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Variable => write!(f, "Variable"),
            ErrorCategory::Registry => write!(f, "Registry"),
            ErrorCategory::Buffer => write!(f, "Buffer"),
            ErrorCategory::Filter => write!(f, "Filter"),
            ErrorCategory::Config => write!(f, "Config"),
            ErrorCategory::IO => write!(f, "IO"),
            ErrorCategory::Other => write!(f, "Other"),
        }
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, the operation was skipped but state is intact
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, system may be in unstable state
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Operation and key-value details attached to an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// The operation that was being performed
    pub operation: String,
    /// Additional context key-value pairs
    pub context: Vec<(String, String)>,
}

impl ErrorContext {
    /// Create a new error context for an operation.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            context: Vec::new(),
        }
    }

    /// Add a context key-value pair.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.push((key.into(), value.to_string()));
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.operation)?;
        for (key, value) in &self.context {
            write!(f, ", {key}: {value}")?;
        }
        Ok(())
    }
}

/// Extension trait for annotating fallible results.
///
/// Not for the hot path: building a context allocates.
pub trait ResultExt<T> {
    /// Wrap the error with `ctx`.
    ///
    /// # Errors
    ///
    /// The original error inside [`RtVarsError::Context`].
    fn context(self, ctx: ErrorContext) -> Result<T, RtVarsError>;

    /// Wrap the error with an operation name.
    ///
    /// # Errors
    ///
    /// The original error inside [`RtVarsError::Context`].
    fn with_context(self, operation: impl Into<String>) -> Result<T, RtVarsError>;
}

impl<T, E: Into<RtVarsError>> ResultExt<T> for Result<T, E> {
    fn context(self, ctx: ErrorContext) -> Result<T, RtVarsError> {
        self.map_err(|e| RtVarsError::Context {
            context: ctx,
            source: Box::new(e.into()),
        })
    }

    fn with_context(self, operation: impl Into<String>) -> Result<T, RtVarsError> {
        self.context(ErrorContext::new(operation))
    }
}

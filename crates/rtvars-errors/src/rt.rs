//! Real-time error types.
//!
//! These are the errors returned from the control-loop thread: variable writes,
//! history buffer ticks and filter updates. They share a set of guarantees:
//! - Copy semantics (no heap allocations)
//! - Numeric error codes for RT-safe reporting
//! - Fixed-size representation

use crate::common::ErrorSeverity;

/// Errors raised by a variable write or by listener management.
///
/// # Examples
///
/// ```
/// use rtvars_errors::{ErrorSeverity, VariableError};
///
/// let err = VariableError::OutOfBounds { value: 4.0, min: -1.0, max: 1.0 };
/// assert_eq!(err.code(), 1);
/// assert_eq!(err.severity(), ErrorSeverity::Warning);
/// assert!(err.is_recoverable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum VariableError {
    /// Value rejected because it lies outside the variable's bounds
    #[error("value {value} is outside bounds [{min}, {max}]")]
    OutOfBounds {
        /// The rejected value
        value: f64,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// Value kind does not match the variable kind
    #[error("kind mismatch: variable is {expected}, value is {actual}")]
    KindMismatch {
        /// Kind of the variable
        expected: &'static str,
        /// Kind of the supplied value
        actual: &'static str,
    },

    /// Listener table modified from inside a notification of the same variable
    #[error("listener table modified during notification")]
    Reentrancy,

    /// Listener handle does not belong to this variable or was already removed
    #[error("listener not registered on this variable")]
    ListenerNotFound,

    /// Enum ordinal outside the constant range, or null when null is not allowed
    #[error("invalid enum ordinal {ordinal} (constants: {constants}, null allowed: {allow_null})")]
    InvalidEnumOrdinal {
        /// Requested ordinal, `-1` for null
        ordinal: i64,
        /// Number of declared constants
        constants: u32,
        /// Whether null is a legal value
        allow_null: bool,
    },

    /// Output variable already has an exclusive writer
    #[error("variable already has an exclusive writer")]
    WriterConflict,
}

impl VariableError {
    /// Get the numeric error code.
    pub fn code(&self) -> u8 {
        match self {
            VariableError::OutOfBounds { .. } => 1,
            VariableError::KindMismatch { .. } => 2,
            VariableError::Reentrancy => 3,
            VariableError::ListenerNotFound => 4,
            VariableError::InvalidEnumOrdinal { .. } => 5,
            VariableError::WriterConflict => 6,
        }
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            VariableError::OutOfBounds { .. } => ErrorSeverity::Warning,
            VariableError::KindMismatch { .. } => ErrorSeverity::Error,
            VariableError::Reentrancy => ErrorSeverity::Error,
            VariableError::ListenerNotFound => ErrorSeverity::Warning,
            VariableError::InvalidEnumOrdinal { .. } => ErrorSeverity::Warning,
            VariableError::WriterConflict => ErrorSeverity::Error,
        }
    }

    /// Check if the caller can carry on (skip or retry) after this error.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Error
    }
}

/// Errors raised by the history buffer.
///
/// # Examples
///
/// ```
/// use rtvars_errors::BufferError;
///
/// let err = BufferError::Range { from: 0, count: 4, first: 6, end: 10 };
/// assert_eq!(err.code(), 18);
/// assert_eq!(err.to_string(), "window [0, +4) does not overlap valid range [6, 10)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum BufferError {
    /// `configure` called on a buffer that is already configured
    #[error("history buffer is already configured")]
    AlreadyConfigured,

    /// Operation requires a configured buffer
    #[error("history buffer is not configured")]
    NotConfigured,

    /// Requested window does not overlap the recorded history
    #[error("window [{from}, +{count}) does not overlap valid range [{first}, {end})")]
    Range {
        /// Requested start
        from: u64,
        /// Requested row count
        count: u64,
        /// First valid index
        first: u64,
        /// One past the last valid index
        end: u64,
    },

    /// Capacity must be positive
    #[error("invalid buffer capacity {capacity}")]
    InvalidCapacity {
        /// Requested capacity
        capacity: usize,
    },

    /// Variable's owning registry has been torn down
    #[error("variable at column {column} is detached from its registry")]
    DetachedVariable {
        /// Column index of the offending variable
        column: usize,
    },

    /// Same variable bound to two columns
    #[error("variable bound twice (columns {first} and {second})")]
    DuplicateColumn {
        /// Column of the first binding
        first: usize,
        /// Column of the repeated binding
        second: usize,
    },

    /// Thinning stride must be positive
    #[error("invalid thinning stride {stride}")]
    InvalidStride {
        /// Requested stride
        stride: usize,
    },
}

impl BufferError {
    /// Get the numeric error code.
    pub fn code(&self) -> u8 {
        match self {
            BufferError::AlreadyConfigured => 16,
            BufferError::NotConfigured => 17,
            BufferError::Range { .. } => 18,
            BufferError::InvalidCapacity { .. } => 19,
            BufferError::DetachedVariable { .. } => 20,
            BufferError::DuplicateColumn { .. } => 21,
            BufferError::InvalidStride { .. } => 22,
        }
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BufferError::Range { .. } => ErrorSeverity::Warning,
            BufferError::AlreadyConfigured
            | BufferError::NotConfigured
            | BufferError::InvalidCapacity { .. }
            | BufferError::DetachedVariable { .. }
            | BufferError::DuplicateColumn { .. }
            | BufferError::InvalidStride { .. } => ErrorSeverity::Error,
        }
    }

    /// Check if the caller can carry on (skip or retry) after this error.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Error
    }
}

/// Errors raised by filter construction and update.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum FilterError {
    /// Non-positive or non-finite timestep passed to `update`
    #[error("invalid timestep {dt}: must be positive and finite")]
    InvalidTimestep {
        /// The rejected timestep in seconds
        dt: f64,
    },

    /// Coefficient outside its legal range
    #[error("invalid filter parameter {name} = {value}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Writing the output variable failed
    #[error(transparent)]
    Variable(#[from] VariableError),
}

impl FilterError {
    /// Get the numeric error code.
    pub fn code(&self) -> u8 {
        match self {
            FilterError::InvalidTimestep { .. } => 32,
            FilterError::InvalidParameter { .. } => 33,
            FilterError::Variable(e) => e.code(),
        }
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FilterError::InvalidTimestep { .. } => ErrorSeverity::Warning,
            FilterError::InvalidParameter { .. } => ErrorSeverity::Error,
            FilterError::Variable(e) => e.severity(),
        }
    }

    /// Check if the caller can carry on (skip or retry) after this error.
    pub fn is_recoverable(&self) -> bool {
        self.severity() < ErrorSeverity::Error
    }
}

//! Error types for the rtvars CLI

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Registry error: {0}")]
    Registry(#[from] rtvars_errors::RegistryError),

    #[error("Buffer error: {0}")]
    Buffer(#[from] rtvars_errors::BufferError),

    #[error("Filter error: {0}")]
    Filter(#[from] rtvars_errors::FilterError),

    #[error("Variable error: {0}")]
    Variable(#[from] rtvars_errors::VariableError),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidConfiguration(_) => 2,
            _ => 1,
        }
    }
}

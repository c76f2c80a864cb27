//! Error types for the gateway domain

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by domain type construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Configuration values violate an invariant
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A file identifier cannot be used as a local file name
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),
}

//! Service-layer error types

use thiserror::Error;

use crate::validation::Violations;

/// Result type alias for service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Service-layer error types
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Input decoded but violates its declared constraints
    #[error("Validation failed: {0}")]
    Validation(#[from] Violations),

    /// Input is structurally unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<billgate_core::CoreError> for ServiceError {
    fn from(err: billgate_core::CoreError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

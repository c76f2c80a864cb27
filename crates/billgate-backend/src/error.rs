//! Backend error types

use thiserror::Error;

/// Errors raised while setting up backend connections
#[derive(Error, Debug)]
pub enum BackendError {
    /// Endpoint URI could not be parsed
    #[error("Invalid endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    /// Channel could not be established
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Storage client could not be built
    #[error("Storage configuration error: {0}")]
    StorageConfiguration(String),
}

/// Errors raised while fetching objects
#[derive(Error, Debug)]
pub enum StorageError {
    /// HTTP request failed before a response arrived
    #[error("Storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Object store answered with a non-success status
    #[error("Storage returned status {status} for object '{key}'")]
    UnexpectedStatus { status: u16, key: String },

    /// Object key cannot be turned into a URL
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// Local file could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! Common error types for Louvor

use thiserror::Error;

/// Common result type for Louvor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Louvor services
#[derive(Error, Debug)]
pub enum Error {
    /// Storage failure (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A record with the same key already exists
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Caller is not allowed to perform the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Internal error (serialization, corrupted stored data)
    #[error("Internal error: {0}")]
    Internal(String),
}

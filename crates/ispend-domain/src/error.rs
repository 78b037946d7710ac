//! Domain error types.

use ispend_store::StoreError;
use thiserror::Error;

/// Errors from the user directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// User, spending or spend kind not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller passed something unusable (e.g. an empty username).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Username already taken.
    #[error("Already exists: {0}")]
    Conflict(String),

    /// Any other store failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DirectoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Conflict(what) => Self::Conflict(what),
            other => Self::Store(other),
        }
    }
}

/// Errors from the session registry.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No live session for the given username or token.
    #[error("Session not found: {0}")]
    NotFound(String),
}

/// Errors from password hashing.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Result type for directory operations.
pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

/// Result type for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

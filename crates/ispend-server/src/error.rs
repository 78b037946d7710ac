//! Error types for the server.

use axum::{
    Json,
    extract::rejection::{FormRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ispend_domain::{DirectoryError, PasswordError, SessionError};
use ispend_types::ApiResponse;
use thiserror::Error;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Missing or foreign session token.
    #[error("{0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Missing or malformed request parameter.
    #[error("{0}")]
    BadRequest(String),

    /// Resource already exists.
    #[error("{0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database/storage error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ServerError {
    /// The caller is not logged in as the user the request targets.
    pub fn not_logged_in() -> Self {
        ServerError::Unauthorized("must be logged in".to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::Internal(_) | ServerError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DirectoryError> for ServerError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::NotFound(what) => ServerError::NotFound(format!("not found: {what}")),
            DirectoryError::InvalidArgument(msg) => ServerError::BadRequest(msg),
            DirectoryError::Conflict(what) => ServerError::Conflict(format!("already exists: {what}")),
            DirectoryError::Store(e) => ServerError::Storage(e.to_string()),
        }
    }
}

impl From<SessionError> for ServerError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(_) => ServerError::NotFound("session not found".to_string()),
        }
    }
}

impl From<PasswordError> for ServerError {
    fn from(e: PasswordError) -> Self {
        ServerError::Internal(e.to_string())
    }
}

impl From<FormRejection> for ServerError {
    fn from(e: FormRejection) -> Self {
        ServerError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(e: QueryRejection) -> Self {
        ServerError::BadRequest(e.body_text())
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details stay in the log.
        let message = match &self {
            ServerError::Internal(_) | ServerError::Storage(_) => {
                tracing::error!(status = %status, error = %self, "Server error");
                "internal server error".to_string()
            }
            _ => {
                tracing::warn!(status = %status, error = %self, "Client error");
                self.to_string()
            }
        };

        (status, Json(ApiResponse::error(status.as_u16(), message))).into_response()
    }
}

//! Session-token authorization.
//!
//! Clients send the token issued by `POST /users/login` in the
//! `X-Ispend-SessionID` header. A request is authorized only when the token
//! is the live session of the username it targets.

use axum::http::HeaderMap;
use tracing::debug;

use crate::error::ServerError;
use crate::state::AppState;

/// Header carrying the session token.
pub const SESSION_HEADER: &str = "X-Ispend-SessionID";

/// Extract the session token from the request headers.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Require that the request carries `username`'s live session token.
pub fn authorize(state: &AppState, headers: &HeaderMap, username: &str) -> Result<(), ServerError> {
    let Some(token) = session_token(headers) else {
        debug!(username, "Missing session header");
        return Err(ServerError::not_logged_in());
    };

    if state.sessions().is_user_logged_in(token, username) {
        Ok(())
    } else {
        Err(ServerError::not_logged_in())
    }
}

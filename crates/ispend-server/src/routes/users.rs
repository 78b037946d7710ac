//! User endpoints: registration, login sessions and profile lookups.

use axum::{
    Json,
    extract::{Form, Path, Query, State, rejection::FormRejection, rejection::QueryRejection},
    http::HeaderMap,
};
use ispend_domain::{DirectoryError, hash_password, verify_password};
use ispend_types::{ApiResponse, SpendKind, User, UserDto};
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::{authorize, session_token};
use crate::error::{Result, ServerError};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Forms
// ─────────────────────────────────────────────────────────────────────────────

/// Registration form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewUserForm {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Login form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Session check and logout form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionForm {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub username: String,
}

/// Query naming the caller of `GET /users`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UsernameQuery {
    pub username: String,
}

fn require<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    if value.is_empty() {
        Err(ServerError::BadRequest(format!("missing {field}")))
    } else {
        Ok(value)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /users - register a new user with the default spend kinds.
pub async fn register_handler(
    State(state): State<AppState>,
    form: std::result::Result<Form<NewUserForm>, FormRejection>,
) -> Result<Json<ApiResponse>> {
    let Form(form) = form?;
    require(&form.password, "password")?;
    require(&form.username, "username")?;

    if state.directory().user_exists(&form.username) {
        return Err(ServerError::Conflict("user exists".to_string()));
    }

    let password = form.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServerError::Internal(format!("hashing task failed: {e}")))??;

    // Each user gets their own copies; ids are assigned on insert.
    let spend_kinds = state
        .directory()
        .get_all_default_spend_kinds()?
        .into_iter()
        .map(|kind| SpendKind::new(kind.name))
        .collect();

    let user = User::new(form.email, form.username, password_hash, spend_kinds);
    let user = state.directory().add_user(user)?;

    info!(username = %user.username, "User registered");
    Ok(Json(ApiResponse::ok("success")))
}

/// GET /users?username= - list every user. The caller must be logged in as
/// `username`.
pub async fn list_users_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: std::result::Result<Query<UsernameQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>> {
    let Query(query) = query?;
    authorize(&state, &headers, &query.username)?;

    let users = state
        .directory()
        .get_all_users()
        .iter()
        .map(UserDto::from)
        .collect();
    Ok(Json(ApiResponse::ok_with_data("success", users)))
}

/// POST /users/login - check the password and hand out a session token.
///
/// A user who is already logged in gets their existing token back.
pub async fn login_handler(
    State(state): State<AppState>,
    form: std::result::Result<Form<LoginForm>, FormRejection>,
) -> Result<Json<ApiResponse<String>>> {
    let Form(form) = form?;
    require(&form.password, "password")?;
    let username = require(&form.username, "username")?.to_string();

    let user = match state.directory().get_user(&username) {
        Ok(user) => user,
        Err(DirectoryError::NotFound(_)) => {
            return Err(ServerError::BadRequest("user does not exist".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let password = form.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &user.password))
        .await
        .map_err(|e| ServerError::Internal(format!("verification task failed: {e}")))?;
    if !valid {
        debug!(username = %username, "Rejected login");
        return Err(ServerError::BadRequest("wrong username/password".to_string()));
    }

    if let Ok(session) = state.sessions().get_by_username(&username) {
        return Ok(Json(ApiResponse::ok_with_data("success", session.session_id)));
    }

    let token = state.sessions().new_session(&username);
    info!(username = %username, "User logged in");
    Ok(Json(ApiResponse::ok_with_data("success", token)))
}

/// POST /users/login/check - whether `sessionId` is `username`'s session.
/// The answer is the message, `"true"` or `"false"`.
pub async fn check_session_handler(
    State(state): State<AppState>,
    form: std::result::Result<Form<SessionForm>, FormRejection>,
) -> Result<Json<ApiResponse>> {
    let Form(form) = form?;
    let session_id = require(&form.session_id, "sessionId")?;
    let username = require(&form.username, "username")?;

    let logged_in = state.sessions().is_user_logged_in(session_id, username);
    Ok(Json(ApiResponse::ok(logged_in.to_string())))
}

/// POST /users/logout - end the session.
pub async fn logout_handler(
    State(state): State<AppState>,
    form: std::result::Result<Form<SessionForm>, FormRejection>,
) -> Result<Json<ApiResponse>> {
    let Form(form) = form?;
    let session_id = require(&form.session_id, "sessionId")?;
    let username = require(&form.username, "username")?;

    let session = state.sessions().get_by_session_id(session_id)?;
    if session.username != username {
        return Err(ServerError::Unauthorized(
            "session belongs to another user".to_string(),
        ));
    }

    state.sessions().remove(&session.username)?;
    info!(username, "User logged out");
    Ok(Json(ApiResponse::ok("success")))
}

/// GET /users/me - the user owning the session in the header.
pub async fn me_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<UserDto>>> {
    let token = session_token(&headers).ok_or_else(ServerError::not_logged_in)?;
    let session = state
        .sessions()
        .get_by_session_id(token)
        .map_err(|_| ServerError::not_logged_in())?;

    let user = state.directory().get_user(&session.username)?;
    Ok(Json(ApiResponse::ok_with_data("success", UserDto::from(&user))))
}

/// GET /users/{username}
pub async fn get_user_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>> {
    authorize(&state, &headers, &username)?;

    let user = state.directory().get_user(&username)?;
    Ok(Json(ApiResponse::ok_with_data("success", UserDto::from(&user))))
}

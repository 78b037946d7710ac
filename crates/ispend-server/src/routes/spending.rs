//! Spending and spend kind endpoints.

use axum::{
    Json,
    extract::{Form, Path, State, rejection::FormRejection},
    http::HeaderMap,
};
use ispend_domain::DirectoryError;
use ispend_types::{ApiResponse, SpendKindDto, SpendKindId, Spending, SpendingDto, SpendingId};
use serde::Deserialize;
use tracing::debug;

use crate::auth::authorize;
use crate::error::{Result, ServerError};
use crate::state::AppState;

/// New spending form. Numbers arrive as text and are parsed here so a bad
/// value gets a precise message.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewSpendingForm {
    pub username: String,
    pub currency: String,
    pub amount: String,
    pub kind_id: String,
}

impl NewSpendingForm {
    fn amount(&self) -> Result<f64> {
        self.amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite())
            .ok_or_else(|| ServerError::BadRequest("missing/wrong amount".to_string()))
    }

    fn kind_id(&self) -> Result<SpendKindId> {
        self.kind_id
            .trim()
            .parse()
            .map_err(|_| ServerError::BadRequest("missing/wrong spending kind ID".to_string()))
    }
}

/// POST /spending - record a spending and return its id.
pub async fn new_spending_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: std::result::Result<Form<NewSpendingForm>, FormRejection>,
) -> Result<Json<ApiResponse<SpendingId>>> {
    let Form(form) = form?;
    if form.username.is_empty() {
        return Err(ServerError::BadRequest("missing username".to_string()));
    }
    authorize(&state, &headers, &form.username)?;

    if form.currency.is_empty() {
        return Err(ServerError::BadRequest("missing/wrong currency".to_string()));
    }
    let amount = form.amount()?;
    let kind_id = form.kind_id()?;

    let kind = match state.directory().get_spend_kind(&form.username, kind_id) {
        Ok(kind) => kind,
        Err(DirectoryError::NotFound(_)) => {
            return Err(ServerError::BadRequest(
                "missing/wrong spending kind ID".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let mut user = state.directory().get_user(&form.username)?;
    let spending = Spending::new(form.currency, amount, kind);
    let id = state.directory().store_spending(&mut user, spending)?;

    debug!(username = %user.username, spend_id = %id, "Spending recorded");
    Ok(Json(ApiResponse::ok_with_data("success", id)))
}

/// DELETE /spending/{username}/{spend_id}
pub async fn delete_spending_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((username, spend_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse>> {
    authorize(&state, &headers, &username)?;

    state.directory().delete_spending(&username, &spend_id)?;
    debug!(username = %username, spend_id = %spend_id, "Spending deleted");
    Ok(Json(ApiResponse::ok("success")))
}

/// GET /spending/id/{id}/{username}
pub async fn get_spending_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((spend_id, username)): Path<(String, String)>,
) -> Result<Json<ApiResponse<SpendingDto>>> {
    authorize(&state, &headers, &username)?;

    let user = state.directory().get_user(&username)?;
    let spending = user
        .spending(&spend_id)
        .ok_or_else(|| ServerError::NotFound("spending not found".to_string()))?;
    Ok(Json(ApiResponse::ok_with_data(
        "success",
        SpendingDto::from(spending),
    )))
}

/// GET /spending/all/{username}
pub async fn list_spends_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<Vec<SpendingDto>>>> {
    authorize(&state, &headers, &username)?;

    let user = state.directory().get_user(&username)?;
    let spends = user.spends.iter().map(SpendingDto::from).collect();
    Ok(Json(ApiResponse::ok_with_data("success", spends)))
}

/// GET /spending/kind - the kinds new users start with.
pub async fn default_spend_kinds_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SpendKindDto>>>> {
    let kinds = state
        .directory()
        .get_all_default_spend_kinds()?
        .iter()
        .map(SpendKindDto::from)
        .collect();
    Ok(Json(ApiResponse::ok_with_data("success", kinds)))
}

/// GET /spending/kind/{username}
pub async fn spend_kinds_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<Vec<SpendKindDto>>>> {
    authorize(&state, &headers, &username)?;

    let kinds = state
        .directory()
        .get_spend_kinds(&username)?
        .iter()
        .map(SpendKindDto::from)
        .collect();
    Ok(Json(ApiResponse::ok_with_data("success", kinds)))
}

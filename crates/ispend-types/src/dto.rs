//! Types that cross the HTTP boundary.

use serde::{Deserialize, Serialize};

use crate::Timestamp;
use crate::spending::{SpendKind, SpendKindId, Spending, SpendingId};
use crate::user::User;

/// Response envelope shared by every API endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = ()> {
    pub status: u16,
    #[serde(rename = "isError")]
    pub is_error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl ApiResponse<()> {
    /// Successful response without a payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: 200,
            is_error: false,
            message: message.into(),
            data: None,
        }
    }

    /// Error response with the given HTTP status code.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            is_error: true,
            message: message.into(),
            data: None,
        }
    }
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`.
    pub fn ok_with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            status: 200,
            is_error: false,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Public view of a spend kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendKindDto {
    pub id: SpendKindId,
    pub name: String,
}

impl From<&SpendKind> for SpendKindDto {
    fn from(kind: &SpendKind) -> Self {
        Self {
            id: kind.id,
            name: kind.name.clone(),
        }
    }
}

/// Public view of a spending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingDto {
    pub id: SpendingId,
    pub currency: String,
    pub amount: f64,
    pub kind: SpendKindDto,
    pub timestamp: Timestamp,
}

impl From<&Spending> for SpendingDto {
    fn from(spending: &Spending) -> Self {
        Self {
            id: spending.id.clone(),
            currency: spending.currency.clone(),
            amount: spending.amount,
            kind: SpendKindDto::from(&spending.kind),
            timestamp: spending.timestamp,
        }
    }
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDto {
    pub email: String,
    pub username: String,
    pub spends: Vec<SpendingDto>,
    #[serde(rename = "spending_kinds")]
    pub spend_kinds: Vec<SpendKindDto>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            username: user.username.clone(),
            spends: user.spends.iter().map(SpendingDto::from).collect(),
            spend_kinds: user.spend_kinds.iter().map(SpendKindDto::from).collect(),
        }
    }
}

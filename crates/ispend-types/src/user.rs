//! Registered users.

use serde::{Deserialize, Serialize};

use crate::spending::{SpendKind, Spending};

/// A registered user together with the collections they own.
///
/// `password` holds the password hash, never the raw password. The type is
/// not meant to leave the process; use [`crate::UserDto`] for that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub spends: Vec<Spending>,
    #[serde(default, rename = "spending_kinds")]
    pub spend_kinds: Vec<SpendKind>,
}

impl User {
    /// Create a user with no spendings and the given spend kinds.
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        spend_kinds: Vec<SpendKind>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password: password_hash.into(),
            spends: Vec::new(),
            spend_kinds,
        }
    }

    /// Find one of the user's spendings by id.
    pub fn spending(&self, id: &str) -> Option<&Spending> {
        self.spends.iter().find(|s| s.id == id)
    }

    /// Find one of the user's spend kinds by name.
    pub fn spend_kind_named(&self, name: &str) -> Option<&SpendKind> {
        self.spend_kinds.iter().find(|k| k.name == name)
    }
}

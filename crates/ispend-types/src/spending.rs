//! Spendings and the categories they are tagged with.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Timestamp, now};

/// Store-assigned spend kind identifier.
pub type SpendKindId = i64;

/// Store-assigned spending identifier (opaque).
pub type SpendingId = String;

/// Names of the spend kinds seeded globally and copied to new users.
pub const DEFAULT_SPEND_KIND_NAMES: [&str; 4] = ["nightlife", "travel", "food", "rent"];

/// A named spending category ("food", "travel", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendKind {
    /// Zero until the store assigns an id.
    #[serde(default)]
    pub id: SpendKindId,
    pub name: String,
}

impl SpendKind {
    /// Create a spend kind that has not been persisted yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }

    /// Create a spend kind with a known id.
    pub fn with_id(id: SpendKindId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for SpendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.id)
    }
}

/// A single recorded expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spending {
    /// Empty until the store assigns an id.
    #[serde(default)]
    pub id: SpendingId,
    pub currency: String,
    pub amount: f64,
    pub kind: SpendKind,
    pub timestamp: Timestamp,
}

impl Spending {
    /// Create a not-yet-persisted spending timestamped now.
    pub fn new(currency: impl Into<String>, amount: f64, kind: SpendKind) -> Self {
        Self {
            id: SpendingId::new(),
            currency: currency.into(),
            amount,
            kind,
            timestamp: now(),
        }
    }

    /// Set the spending timestamp.
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }
}

impl fmt::Display for Spending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Spend ID[{}] {:.2}[{}] {} {}",
            self.id,
            self.amount,
            self.currency,
            self.kind.name,
            self.timestamp.to_rfc3339()
        )
    }
}

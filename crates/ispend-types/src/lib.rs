//! Shared types for the ispend expense tracker.
//!
//! Holds the data model persisted by the store and cached by the user
//! directory, plus the DTOs that leave the process over HTTP.

pub mod dto;
pub mod spending;
pub mod user;

pub use dto::{ApiResponse, SpendKindDto, SpendingDto, UserDto};
pub use spending::{SpendKind, SpendKindId, Spending, SpendingId};
pub use user::User;

/// Timestamp type used throughout the system.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

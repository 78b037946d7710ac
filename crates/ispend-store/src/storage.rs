//! Storage abstraction for users and their spending data.
//!
//! ```text
//! SpenderStore (trait)     - users, spend kinds, spendings
//!     └── SqliteStore      - durable SQLite implementation
//!     └── InMemoryStore    - mutex-guarded maps, for tests and demos
//! ```
//!
//! Every lookup miss (unknown user, kind or spending) is reported as
//! [`StoreError::NotFound`](crate::StoreError::NotFound); inserting a
//! username that already exists is
//! [`StoreError::Conflict`](crate::StoreError::Conflict).

use ispend_types::{SpendKind, SpendKindId, Spending, SpendingId, User};

use crate::Result;

/// Source of truth for users, spend kinds and spendings.
pub trait SpenderStore: Send + Sync {
    /// Check that the backing store is reachable.
    fn open(&self) -> Result<()> {
        Ok(())
    }

    /// Flush and release whatever the store can release without being dropped.
    fn close(&self) -> Result<()> {
        Ok(())
    }

    // ── Spend kinds ─────────────────────────────────────────────────────

    /// Add a spend kind to the global default set, returning its id.
    fn store_default_spend_kind(&self, kind: &SpendKind) -> Result<SpendKindId>;

    /// List the global default spend kinds.
    fn get_all_default_spend_kinds(&self) -> Result<Vec<SpendKind>>;

    /// Get one of `username`'s spend kinds by id.
    fn get_spend_kind(&self, username: &str, id: SpendKindId) -> Result<SpendKind>;

    /// List `username`'s spend kinds.
    fn get_spend_kinds(&self, username: &str) -> Result<Vec<SpendKind>>;

    /// Add a spend kind owned by `username`, returning its id.
    fn store_spend_kind(&self, username: &str, kind: &SpendKind) -> Result<SpendKindId>;

    // ── Users ───────────────────────────────────────────────────────────

    /// Persist the base user record (email, username, password hash).
    ///
    /// Spends and spend kinds carried by `user` are not stored.
    fn store_user(&self, user: &User) -> Result<()>;

    /// Get a user. With `load_all` the spends and spend kinds are loaded too.
    fn get_user(&self, username: &str, load_all: bool) -> Result<User>;

    /// List every user in insertion order.
    fn get_all_users(&self, load_all: bool) -> Result<Vec<User>>;

    // ── Spendings ───────────────────────────────────────────────────────

    /// Persist a spending for `username`, returning the assigned id.
    ///
    /// If the user has no spend kind named like `spending.kind`, one is
    /// created for them.
    fn store_spending(&self, username: &str, spending: &Spending) -> Result<SpendingId>;

    /// List `username`'s spendings in insertion order.
    fn get_spends(&self, username: &str) -> Result<Vec<Spending>>;

    /// Delete one of `username`'s spendings.
    fn delete_spending(&self, username: &str, spend_id: &str) -> Result<()>;
}

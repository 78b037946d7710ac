//! Persistent storage for ispend.
//!
//! The [`SpenderStore`] trait is the source of truth the user directory
//! caches in front of. [`SqliteStore`] is the durable backend;
//! [`InMemoryStore`] serves tests and throwaway instances.

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod storage;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use storage::SpenderStore;

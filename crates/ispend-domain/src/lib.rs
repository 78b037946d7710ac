//! Domain layer for ispend.
//!
//! Sits between the HTTP server and the store:
//!
//! - **User directory**: cache-aside access to users, spendings and spend
//!   kinds, with atomic username reservation
//! - **Session registry**: login tokens keyed by username, optional expiry
//! - **Passwords**: Argon2id hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use ispend_domain::{DomainServices, SessionConfig};
//!
//! let services = DomainServices::new(store, CacheConfig::default(), SessionConfig::default())?;
//! let user = services.directory().get_user("alice")?;
//! let token = services.sessions().new_session("alice");
//! ```

mod error;
pub mod password;
pub mod services;

pub use error::{DirectoryError, DirectoryResult, PasswordError, SessionError, SessionResult};
pub use password::{hash_password, verify_password};
pub use services::DomainServices;
pub use services::directory::{CachedCollection, UserDirectory};
pub use services::sessions::{LoginSession, SessionConfig, SessionRegistry, spawn_sweeper};

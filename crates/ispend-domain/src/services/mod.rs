//! Domain services.
//!
//! The user directory and session registry the HTTP layer works through.

pub mod directory;
pub mod sessions;

use std::sync::Arc;

use ispend_cache::{BoundedCache, Cache, CacheConfig};
use ispend_store::SpenderStore;
use tracing::info;

use crate::error::DirectoryResult;
use directory::{CachedCollection, UserDirectory};
use sessions::{SessionConfig, SessionRegistry};

/// Domain services facade.
///
/// Cheap to clone; every clone shares the same directory and sessions.
#[derive(Clone)]
pub struct DomainServices {
    directory: Arc<UserDirectory>,
    sessions: Arc<SessionRegistry>,
}

impl DomainServices {
    /// Build the directory over `store` with a bounded cache and an empty
    /// session registry.
    pub fn new(
        store: Arc<dyn SpenderStore>,
        cache_config: CacheConfig,
        session_config: SessionConfig,
    ) -> DirectoryResult<Self> {
        let cache: Arc<dyn Cache<CachedCollection>> = Arc::new(BoundedCache::new(cache_config));
        Self::with_cache(store, cache, session_config)
    }

    /// Build the services with a caller-supplied cache.
    pub fn with_cache(
        store: Arc<dyn SpenderStore>,
        cache: Arc<dyn Cache<CachedCollection>>,
        session_config: SessionConfig,
    ) -> DirectoryResult<Self> {
        info!("Initializing domain services");

        let directory = UserDirectory::initialize(store, cache)?;
        let sessions = SessionRegistry::new(session_config);

        Ok(Self {
            directory: Arc::new(directory),
            sessions: Arc::new(sessions),
        })
    }

    /// Get the user directory.
    pub fn directory(&self) -> &Arc<UserDirectory> {
        &self.directory
    }

    /// Get the session registry.
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }
}

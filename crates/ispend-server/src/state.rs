//! Application state shared across handlers.

use std::sync::Arc;

use ispend_domain::{DomainServices, SessionRegistry, UserDirectory};

use crate::config::ServerConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Directory and session registry.
    pub services: DomainServices,

    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(services: DomainServices, config: ServerConfig) -> Self {
        Self {
            services,
            config: Arc::new(config),
        }
    }

    pub fn directory(&self) -> &UserDirectory {
        self.services.directory()
    }

    pub fn sessions(&self) -> &SessionRegistry {
        self.services.sessions()
    }
}

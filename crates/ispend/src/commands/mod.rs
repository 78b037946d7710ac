//! CLI command handlers.

pub mod check_config;
pub mod serve;

use std::path::PathBuf;

use anyhow::Result;
use ispend_config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit config file, if given.
    pub config_path: Option<PathBuf>,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Discover and validate the configuration.
    pub fn load_config(&self) -> Result<LoadedConfig> {
        Ok(ispend_config::load_config(self.config_path.as_deref())?)
    }
}

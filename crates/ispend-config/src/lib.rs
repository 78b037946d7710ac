//! Configuration for the ispend server.
//!
//! Provides YAML or TOML configuration with:
//! - Listener address (`server`)
//! - Store backend selection (`store`)
//! - Directory cache bounds (`cache`)
//! - Login session expiry (`sessions`)
//!
//! See [`discovery`] for where config files are looked up.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{CONFIG_ENV, LoadedConfig, load_config, load_config_file, user_config_path};
pub use error::{ConfigError, Result};
pub use types::*;

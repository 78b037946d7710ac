//! Config file discovery.
//!
//! The first existing candidate wins; nothing is merged:
//! 1. An explicit path (`--config`)
//! 2. `ISPEND_CONFIG` environment variable
//! 3. `./ispend.yaml`
//! 4. `<config dir>/ispend/config.yaml`
//! 5. Built-in defaults
//!
//! An explicit path or `ISPEND_CONFIG` that does not exist is an error; the
//! implicit locations are skipped when missing.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ConfigError, IspendConfig, Result};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "ISPEND_CONFIG";

/// Default config filename in the working directory.
const PROJECT_CONFIG_FILE: &str = "ispend.yaml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.yaml";

/// Application name for config directory resolution.
const APP_NAME: &str = "ispend";

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The validated configuration.
    pub config: IspendConfig,
    /// File the config came from, `None` when defaults were used.
    pub source: Option<PathBuf>,
}

/// Discover, load and validate the configuration.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let env_path = std::env::var(CONFIG_ENV).ok().filter(|v| !v.is_empty());
    load_config_with_options(
        explicit,
        env_path.as_deref().map(Path::new),
        Path::new("."),
        user_config_path().as_deref(),
    )
}

/// Discovery with every location supplied by the caller.
pub fn load_config_with_options(
    explicit: Option<&Path>,
    env_path: Option<&Path>,
    working_dir: &Path,
    user_config: Option<&Path>,
) -> Result<LoadedConfig> {
    let required = explicit.or(env_path);

    let source = match required {
        Some(path) => Some(path.to_path_buf()),
        None => [Some(working_dir.join(PROJECT_CONFIG_FILE)), user_config.map(Path::to_path_buf)]
            .into_iter()
            .flatten()
            .find(|p| p.is_file()),
    };

    let config = match &source {
        Some(path) => load_config_file(path)?,
        None => {
            debug!("No config file found, using defaults");
            IspendConfig::default()
        }
    };
    config.validate()?;

    Ok(LoadedConfig { config, source })
}

/// Load config from a specific file path (no discovery, no validation).
///
/// `.toml` files are parsed as TOML, everything else as YAML.
pub fn load_config_file(path: &Path) -> Result<IspendConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    debug!(path = %path.display(), "Loading config file");

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => IspendConfig::from_toml(&contents),
        _ => IspendConfig::from_yaml(&contents),
    }
}

/// Path of the per-user config file, e.g. `~/.config/ispend/config.yaml`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME).join(USER_CONFIG_FILE))
}

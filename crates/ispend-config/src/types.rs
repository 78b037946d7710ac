//! Configuration types.
//!
//! ```yaml
//! server:
//!   host: 127.0.0.1
//!   port: 8080
//! store:
//!   kind: sqlite        # or: memory
//!   path: ./ispend.db
//! cache:
//!   max_entries: 100000
//!   max_cost: 1073741824
//! sessions:
//!   ttl_secs: 86400     # omit to keep sessions until logout
//!   sweep_interval_secs: 60
//! ```
//!
//! The same layout works as TOML with one table per section.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure. Every section has defaults, so an empty
/// file is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IspendConfig {
    pub server: ServerSection,
    pub store: StoreSection,
    pub cache: CacheSection,
    pub sessions: SessionsSection,
}

impl IspendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml_str)?)
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.store.kind == StoreKind::Sqlite && self.store.path.is_none() {
            return Err(ConfigError::Invalid(
                "store.path is required when store.kind is sqlite".into(),
            ));
        }
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "cache.max_entries must be greater than zero".into(),
            ));
        }
        if self.cache.max_cost == 0 {
            return Err(ConfigError::Invalid(
                "cache.max_cost must be greater than zero".into(),
            ));
        }
        if self.sessions.ttl_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "sessions.ttl_secs must be greater than zero when set".into(),
            ));
        }
        if self.sessions.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sessions.sweep_interval_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Which store backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Process memory; lost on restart.
    #[default]
    Memory,
    /// SQLite database file at `store.path`.
    Sqlite,
}

/// Store settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub kind: StoreKind,
    pub path: Option<PathBuf>,
}

/// Directory cache bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub max_entries: usize,
    pub max_cost: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: 100_000,
            max_cost: 1 << 30,
        }
    }
}

/// Login session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
    pub sweep_interval_secs: u64,
}

impl Default for SessionsSection {
    fn default() -> Self {
        Self {
            ttl_secs: None,
            sweep_interval_secs: 60,
        }
    }
}

impl SessionsSection {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = IspendConfig::from_yaml("{}").unwrap();
        assert_eq!(config, IspendConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
server:
  port: 9000
store:
  kind: sqlite
  path: /var/lib/ispend/ispend.db
sessions:
  ttl_secs: 3600
"#;
        let config = IspendConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.store.kind, StoreKind::Sqlite);
        assert_eq!(config.sessions.ttl(), Some(Duration::from_secs(3600)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[server]
host = "0.0.0.0"

[cache]
max_entries = 10
"#;
        let config = IspendConfig::from_toml(toml).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cache.max_entries, 10);
        assert_eq!(config.cache.max_cost, 1 << 30);
        assert_eq!(config.sessions.ttl(), None);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = IspendConfig::new();
        config.store.kind = StoreKind::Sqlite;
        config.store.path = Some(PathBuf::from("ispend.db"));
        let parsed = IspendConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_store_kind() {
        assert!(matches!(
            IspendConfig::from_yaml("store:\n  kind: postgres\n"),
            Err(ConfigError::ParseYaml(_))
        ));
    }

    #[test]
    fn test_validate_rejects() {
        let mut sqlite_without_path = IspendConfig::new();
        sqlite_without_path.store.kind = StoreKind::Sqlite;

        let mut zero_entries = IspendConfig::new();
        zero_entries.cache.max_entries = 0;

        let mut zero_cost = IspendConfig::new();
        zero_cost.cache.max_cost = 0;

        let mut zero_ttl = IspendConfig::new();
        zero_ttl.sessions.ttl_secs = Some(0);

        for config in [sqlite_without_path, zero_entries, zero_cost, zero_ttl] {
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }
    }
}

//! # Node Configuration
//!
//! Loaded from an optional TOML file named by `MB_CONFIG`, then overridden
//! by environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `MB_HOST` | `server.host` |
//! | `MB_IDENTITY_KEY` | `server.identity_private_key` |
//! | `MB_DATA_DIR` | `storage.data_dir` |
//! | `MB_STORAGE` | `storage.backend` (`memory` or `rocksdb`) |
//! | `MB_FORWARD_TIMEOUT_MS` | `forwarding.timeout_ms` |
//!
//! Every section and field has a default, so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use mb_02_topic_admission::{AdmissionConfig, AdmissionLimits};
use mb_04_permissions::{SmartDefaults, BLOCKED_FEE};

pub const CONFIG_PATH_ENV: &str = "MB_CONFIG";

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub forwarding: ForwardingConfig,
    pub admission: AdmissionSection,
    pub permissions: PermissionsConfig,
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Malformed config: {0}")]
    Parse(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

fn invalid(key: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        message: message.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Public URL other hosts reach this relay on. Advertised on the overlay.
    pub host: String,
    /// Hex secp256k1 secret of the relay identity. An ephemeral identity is
    /// generated when unset.
    pub identity_private_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "http://127.0.0.1:8080".to_string(),
            identity_private_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Rocksdb,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "rocksdb" => Ok(StorageBackend::Rocksdb),
            other => Err(invalid("storage.backend", format!("unknown backend `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Per-request timeout for calls to remote hosts.
    pub timeout_ms: u64,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self { timeout_ms: 10_000 }
    }
}

impl ForwardingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionSection {
    pub max_workers: usize,
    pub max_host_bytes: usize,
    pub max_nonce_bytes: usize,
}

impl Default for AdmissionSection {
    fn default() -> Self {
        let limits = AdmissionLimits::default();
        Self {
            max_workers: AdmissionConfig::default().max_workers,
            max_host_bytes: limits.max_host_bytes,
            max_nonce_bytes: limits.max_nonce_bytes,
        }
    }
}

impl AdmissionSection {
    pub fn to_admission_config(&self) -> AdmissionConfig {
        AdmissionConfig {
            max_workers: self.max_workers,
            limits: AdmissionLimits {
                max_host_bytes: self.max_host_bytes,
                max_nonce_bytes: self.max_nonce_bytes,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsConfig {
    pub notifications_fee: i64,
    pub standard_fee: i64,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        let defaults = SmartDefaults::default();
        Self {
            notifications_fee: defaults.notifications_fee,
            standard_fee: defaults.standard_fee,
        }
    }
}

impl PermissionsConfig {
    pub fn smart_defaults(&self) -> SmartDefaults {
        SmartDefaults {
            notifications_fee: self.notifications_fee,
            standard_fee: self.standard_fee,
        }
    }
}

impl NodeConfig {
    /// Parse a TOML document.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&raw)
    }

    /// File named by `MB_CONFIG` (if any) plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `MB_*` overrides from `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("MB_HOST") {
            self.server.host = host;
        }
        if let Some(key) = lookup("MB_IDENTITY_KEY") {
            self.server.identity_private_key = Some(key);
        }
        if let Some(dir) = lookup("MB_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = lookup("MB_STORAGE") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(timeout) = lookup("MB_FORWARD_TIMEOUT_MS") {
            self.forwarding.timeout_ms = timeout
                .trim()
                .parse()
                .map_err(|_| invalid("forwarding.timeout_ms", format!("`{timeout}` is not a number")))?;
        }
        Ok(())
    }

    /// Reject values the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self.server.host.trim();
        if host.is_empty() {
            return Err(invalid("server.host", "must not be empty"));
        }
        if !host.contains('.') {
            return Err(invalid("server.host", "must contain a domain separator"));
        }
        if host.len() > self.admission.max_host_bytes {
            return Err(invalid("server.host", "longer than the admission host limit"));
        }
        if self.forwarding.timeout_ms == 0 {
            return Err(invalid("forwarding.timeout_ms", "must be greater than zero"));
        }
        if self.admission.max_workers == 0 {
            return Err(invalid("admission.max_workers", "must be at least 1"));
        }
        for (key, fee) in [
            ("permissions.notifications_fee", self.permissions.notifications_fee),
            ("permissions.standard_fee", self.permissions.standard_fee),
        ] {
            if fee < BLOCKED_FEE {
                return Err(invalid(key, format!("{fee} is below -1")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = NodeConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.forwarding.timeout(), Duration::from_secs(10));
        assert_eq!(config.admission.max_workers, 4);
        assert_eq!(config.permissions.notifications_fee, 10);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = NodeConfig::from_toml(
            r#"
            [server]
            host = "https://relay.example.com"

            [storage]
            backend = "rocksdb"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "https://relay.example.com");
        assert_eq!(config.storage.backend, StorageBackend::Rocksdb);
        assert_eq!(config.forwarding.timeout_ms, 10_000);
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = NodeConfig::default();
        config
            .apply_overrides(env(&[
                ("MB_HOST", "https://other.example.org"),
                ("MB_FORWARD_TIMEOUT_MS", "250"),
                ("MB_STORAGE", "Memory"),
                ("MB_DATA_DIR", "/var/lib/mb"),
            ]))
            .unwrap();

        assert_eq!(config.server.host, "https://other.example.org");
        assert_eq!(config.forwarding.timeout_ms, 250);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/mb"));
    }

    #[test]
    fn test_bad_override_rejected() {
        let mut config = NodeConfig::default();
        assert!(matches!(
            config.apply_overrides(env(&[("MB_FORWARD_TIMEOUT_MS", "soon")])),
            Err(ConfigError::InvalidValue { key: "forwarding.timeout_ms", .. })
        ));
        assert!(matches!(
            config.apply_overrides(env(&[("MB_STORAGE", "postgres")])),
            Err(ConfigError::InvalidValue { key: "storage.backend", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = NodeConfig::default();
        config.server.host = "localhost".into();
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.forwarding.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.admission.max_workers = 0;
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.permissions.standard_fee = -3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            NodeConfig::from_toml("[server\nhost = 1"),
            Err(ConfigError::Parse(_))
        ));
    }
}

//! Stack configuration
//!
//! Loaded from a TOML file; every field has a default so a partial file
//! (or none at all) is valid.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_IFACE, MAX_IF_NAME_SIZE, MAX_INTERFACES};
use crate::error::ConfigError;
use crate::network::SockOptions;

/// Top-level configuration of the socket layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Interface whose hardware address identifies this node
    pub default_iface: String,

    /// Upper bound for interface enumeration
    pub max_interfaces: usize,

    /// Log filter used when `RUST_LOG` is not set
    pub log_filter: String,

    /// Options applied to UDP sockets opened by the protocol engines
    pub udp: SockOptions,

    /// Options applied to TCP sockets opened by the protocol engines
    pub tcp: SockOptions,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            default_iface: DEFAULT_IFACE.to_string(),
            max_interfaces: MAX_INTERFACES,
            log_filter: "info".to_string(),
            udp: SockOptions::default(),
            tcp: SockOptions::default(),
        }
    }
}

impl StackConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: StackConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Per-user configuration file location
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "tcnopen", "tcn-sock")
            .map(|dirs| dirs.config_dir().join("tcn-sock.toml"))
    }

    /// Load the per-user file if present, defaults otherwise
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::info!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_iface.is_empty() || self.default_iface.len() >= MAX_IF_NAME_SIZE {
            return Err(ConfigError::Invalid(format!(
                "default_iface must be 1..{} bytes, got '{}'",
                MAX_IF_NAME_SIZE - 1,
                self.default_iface
            )));
        }
        for (name, options) in [("udp", &self.udp), ("tcp", &self.tcp)] {
            if let Some(qos) = options.qos {
                if qos > 7 {
                    return Err(ConfigError::Invalid(format!(
                        "{}.qos must be 0..=7, got {}",
                        name, qos
                    )));
                }
            }
        }
        Ok(())
    }
}

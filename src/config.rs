//! Configuration file parsing
//!
//! Parses TOML configuration files for the node attach plugin. Every section
//! and key is optional.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::iscsi::DEFAULT_PORT;
use crate::node::AttachSettings;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Plugin configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Node settings
    #[serde(default)]
    pub node: NodeConfig,

    /// iSCSI settings
    #[serde(default)]
    pub iscsi: IscsiConfig,
}

/// Node settings
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Filesystem used when a publish request names none
    #[serde(default = "default_fs_type")]
    pub default_fs_type: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_fs_type: default_fs_type(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fs_type() -> String {
    "ext4".to_string()
}

/// iSCSI settings
#[derive(Debug, Clone, Deserialize)]
pub struct IscsiConfig {
    /// Port appended to portals that carry none
    #[serde(default = "default_port")]
    pub default_port: u16,
}

impl Default for IscsiConfig {
    fn default() -> Self {
        Self {
            default_port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Settings for the attach workflow
    pub fn attach_settings(&self) -> AttachSettings {
        AttachSettings {
            default_port: self.iscsi.default_port,
            default_fs_type: self.node.default_fs_type.clone(),
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.iscsi.default_port == 0 {
            return Err(ConfigError::Invalid(
                "iscsi.default_port must be non-zero".to_string(),
            ));
        }

        if self.node.default_fs_type.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "node.default_fs_type must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

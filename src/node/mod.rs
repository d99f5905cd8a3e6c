//! Node attach workflow
//!
//! This module defines the traits for the external transport and mount
//! collaborators and the workflow that drives them with resolved bundles.

mod attacher;

pub use attacher::NodeAttacher;

use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::iscsi::{ConnectorRecord, DEFAULT_PORT};

/// iSCSI transport - discovery, login and logout
pub trait Transport: Send + Sync {
    /// Log in to the connector's targets and return the block device path.
    fn connect(&self, connector: &ConnectorRecord) -> Result<PathBuf>;

    /// Log out of every session belonging to `volume_name`.
    fn disconnect(&self, volume_name: &str) -> Result<()>;
}

/// Host filesystem operations
pub trait Mounter: Send + Sync {
    /// Format if needed and mount `device` at `target`.
    fn mount(
        &self,
        device: &Path,
        target: &Path,
        fs_type: &str,
        options: &[String],
        read_only: bool,
    ) -> Result<()>;

    /// Unmount whatever is mounted at `target`.
    fn unmount(&self, target: &Path) -> Result<()>;
}

/// Workflow settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachSettings {
    /// Port appended to portals that carry none
    pub default_port: u16,
    /// Filesystem used when a request names none
    pub default_fs_type: String,
}

impl Default for AttachSettings {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT,
            default_fs_type: "ext4".to_string(),
        }
    }
}

/// A volume publish request
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    pub volume_id: String,
    /// Volume attributes, see [`crate::iscsi::descriptor::keys`]
    pub volume_context: HashMap<String, String>,
    pub read_only: bool,
    pub fs_type: String,
    pub mount_flags: Vec<String>,
    pub target_path: PathBuf,
}

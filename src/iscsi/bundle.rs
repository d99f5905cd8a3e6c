//! Mount and unmount operation bundles

use std::path::PathBuf;

use super::connector::ConnectorRecord;
use super::descriptor::ConnectionDescriptor;

/// Everything needed to attach and mount one volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountBundle {
    pub descriptor: ConnectionDescriptor,
    pub connector: ConnectorRecord,
    pub fs_type: String,
    pub read_only: bool,
    pub mount_options: Vec<String>,
    pub target_path: PathBuf,
}

/// Detach works from the volume identity alone; the descriptor used at
/// attach time is not assumed to be available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmountBundle {
    pub volume_name: String,
}

pub fn build_mount_bundle(
    descriptor: ConnectionDescriptor,
    connector: ConnectorRecord,
    fs_type: impl Into<String>,
    read_only: bool,
    mount_options: Vec<String>,
    target_path: impl Into<PathBuf>,
) -> MountBundle {
    MountBundle {
        descriptor,
        connector,
        fs_type: fs_type.into(),
        read_only,
        mount_options,
        target_path: target_path.into(),
    }
}

pub fn build_unmount_bundle(volume_name: impl Into<String>) -> UnmountBundle {
    UnmountBundle {
        volume_name: volume_name.into(),
    }
}

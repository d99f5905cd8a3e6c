//! Publish/unpublish driver
//!
//! Resolves a request into bundles and hands them to the collaborators.
//! Validation failures abort before the transport is touched.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::{AttachSettings, Mounter, PublishRequest, Transport};
use crate::iscsi::{
    build_mount_bundle, build_unmount_bundle, ConnectionDescriptor, ConnectorRecord, MountBundle,
    RawContext,
};

/// Attach/detach workflow over a transport and a mounter
pub struct NodeAttacher<T: Transport, M: Mounter> {
    transport: T,
    mounter: M,
    settings: AttachSettings,
}

impl<T: Transport, M: Mounter> NodeAttacher<T, M> {
    pub fn new(transport: T, mounter: M, settings: AttachSettings) -> Self {
        Self {
            transport,
            mounter,
            settings,
        }
    }

    /// Resolve a publish request into a mount bundle without side effects
    pub fn resolve(&self, req: &PublishRequest) -> Result<MountBundle> {
        let ctx = RawContext::from_volume_context(&req.volume_context);
        let descriptor = ConnectionDescriptor::build(&req.volume_id, &ctx, self.settings.default_port)
            .with_context(|| format!("Invalid iSCSI parameters for volume {}", req.volume_id))?;
        let connector = ConnectorRecord::assemble(&descriptor, self.settings.default_port);

        let fs_type = if req.fs_type.is_empty() {
            self.settings.default_fs_type.clone()
        } else {
            req.fs_type.clone()
        };

        Ok(build_mount_bundle(
            descriptor,
            connector,
            fs_type,
            req.read_only,
            req.mount_flags.clone(),
            req.target_path.clone(),
        ))
    }

    /// Attach the volume and mount it at the request's target path.
    /// Returns the attached device path.
    pub fn publish(&self, req: &PublishRequest) -> Result<PathBuf> {
        let bundle = self.resolve(req)?;
        let volume = bundle.descriptor.volume_name();

        log::info!(
            "Attaching volume {} ({} lun {}, multipath: {})",
            volume,
            bundle.connector.target_iqn,
            bundle.connector.lun,
            bundle.connector.multipath
        );

        let device = self
            .transport
            .connect(&bundle.connector)
            .with_context(|| format!("Failed to attach volume {}", volume))?;

        log::debug!("Volume {} attached at {:?}", volume, device);

        if let Err(e) = self.mounter.mount(
            &device,
            &bundle.target_path,
            &bundle.fs_type,
            &bundle.mount_options,
            bundle.read_only,
        ) {
            log::error!("Mount of {:?} failed, detaching volume {}", bundle.target_path, volume);
            if let Err(detach_err) = self.transport.disconnect(volume) {
                log::warn!("Failed to detach volume {} after mount failure: {:#}", volume, detach_err);
            }
            return Err(e.context(format!(
                "Failed to mount {:?} at {:?}",
                device, bundle.target_path
            )));
        }

        log::info!("Volume {} mounted at {:?}", volume, bundle.target_path);
        Ok(device)
    }

    /// Unmount `target_path` and detach the volume
    pub fn unpublish(&self, volume_id: &str, target_path: &Path) -> Result<()> {
        let bundle = build_unmount_bundle(volume_id);

        self.mounter
            .unmount(target_path)
            .with_context(|| format!("Failed to unmount {:?}", target_path))?;

        self.detach(&bundle.volume_name)
    }

    /// Detach a volume known only by its identity
    pub fn detach_volume(&self, volume_id: &str) -> Result<()> {
        let bundle = build_unmount_bundle(volume_id);
        self.detach(&bundle.volume_name)
    }

    fn detach(&self, volume: &str) -> Result<()> {
        self.transport
            .disconnect(volume)
            .with_context(|| format!("Failed to detach volume {}", volume))?;

        log::info!("Volume {} detached", volume);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iscsi::descriptor::keys;
    use crate::iscsi::AttachError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTransport {
        connected: Mutex<Vec<ConnectorRecord>>,
        disconnected: Mutex<Vec<String>>,
    }

    impl Transport for FakeTransport {
        fn connect(&self, connector: &ConnectorRecord) -> Result<PathBuf> {
            self.connected.lock().unwrap().push(connector.clone());
            Ok(PathBuf::from("/dev/sdb"))
        }

        fn disconnect(&self, volume_name: &str) -> Result<()> {
            self.disconnected.lock().unwrap().push(volume_name.to_string());
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct MountCall {
        device: PathBuf,
        target: PathBuf,
        fs_type: String,
        options: Vec<String>,
        read_only: bool,
    }

    #[derive(Default)]
    struct FakeMounter {
        fail_mount: bool,
        mounts: Mutex<Vec<MountCall>>,
        unmounts: Mutex<Vec<PathBuf>>,
    }

    impl Mounter for FakeMounter {
        fn mount(
            &self,
            device: &Path,
            target: &Path,
            fs_type: &str,
            options: &[String],
            read_only: bool,
        ) -> Result<()> {
            if self.fail_mount {
                anyhow::bail!("mount: wrong fs type");
            }
            self.mounts.lock().unwrap().push(MountCall {
                device: device.to_path_buf(),
                target: target.to_path_buf(),
                fs_type: fs_type.to_string(),
                options: options.to_vec(),
                read_only,
            });
            Ok(())
        }

        fn unmount(&self, target: &Path) -> Result<()> {
            self.unmounts.lock().unwrap().push(target.to_path_buf());
            Ok(())
        }
    }

    fn request() -> PublishRequest {
        let volume_context: HashMap<String, String> = [
            (keys::TARGET_PORTAL, "10.0.0.1"),
            (keys::IQN, "iqn.2020-01.test:disk1"),
            (keys::LUN, "0"),
            (keys::PORTALS, "10.0.0.1,10.0.0.2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        PublishRequest {
            volume_id: "vol-1".to_string(),
            volume_context,
            read_only: false,
            fs_type: String::new(),
            mount_flags: vec!["discard".to_string()],
            target_path: PathBuf::from("/mnt/vol-1"),
        }
    }

    fn attacher(fail_mount: bool) -> NodeAttacher<FakeTransport, FakeMounter> {
        NodeAttacher::new(
            FakeTransport::default(),
            FakeMounter {
                fail_mount,
                ..FakeMounter::default()
            },
            AttachSettings::default(),
        )
    }

    #[test]
    fn test_publish_connects_then_mounts() {
        let node = attacher(false);
        let device = node.publish(&request()).unwrap();
        assert_eq!(device, PathBuf::from("/dev/sdb"));

        let connected = node.transport.connected.lock().unwrap();
        assert_eq!(connected.len(), 1);
        assert!(connected[0].multipath);
        assert_eq!(connected[0].targets.len(), 3);

        let mounts = node.mounter.mounts.lock().unwrap();
        assert_eq!(
            mounts[..],
            [MountCall {
                device: PathBuf::from("/dev/sdb"),
                target: PathBuf::from("/mnt/vol-1"),
                fs_type: "ext4".to_string(),
                options: vec!["discard".to_string()],
                read_only: false,
            }]
        );
    }

    #[test]
    fn test_requested_fs_type_wins() {
        let node = attacher(false);
        let req = PublishRequest {
            fs_type: "xfs".to_string(),
            read_only: true,
            ..request()
        };

        let bundle = node.resolve(&req).unwrap();
        assert_eq!(bundle.fs_type, "xfs");
        assert!(bundle.read_only);
    }

    #[test]
    fn test_invalid_request_never_reaches_transport() {
        let node = attacher(false);
        let mut req = request();
        req.volume_context.insert(keys::LUN.to_string(), String::new());

        let err = node.publish(&req).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AttachError>(),
            Some(AttachError::MissingTargetInfo)
        ));
        assert!(node.transport.connected.lock().unwrap().is_empty());
        assert!(node.mounter.mounts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_mount_failure_detaches() {
        let node = attacher(true);
        assert!(node.publish(&request()).is_err());

        assert_eq!(node.transport.connected.lock().unwrap().len(), 1);
        assert_eq!(node.transport.disconnected.lock().unwrap()[..], ["vol-1"]);
    }

    #[test]
    fn test_unpublish_unmounts_then_detaches() {
        let node = attacher(false);
        node.unpublish("vol-1", Path::new("/mnt/vol-1")).unwrap();

        assert_eq!(
            node.mounter.unmounts.lock().unwrap()[..],
            [PathBuf::from("/mnt/vol-1")]
        );
        assert_eq!(node.transport.disconnected.lock().unwrap()[..], ["vol-1"]);
    }

    #[test]
    fn test_detach_by_identity() {
        let node = attacher(false);
        node.detach_volume("vol-9").unwrap();

        assert!(node.mounter.unmounts.lock().unwrap().is_empty());
        assert_eq!(node.transport.disconnected.lock().unwrap()[..], ["vol-9"]);
    }
}

//! Connector record assembly
//!
//! A [`ConnectorRecord`] is the pure-data description the transport layer
//! uses to discover and log in to a target.

use serde::{Deserialize, Serialize};

use super::descriptor::ConnectionDescriptor;
use super::secret::ChapCredentials;

/// One target/portal pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub iqn: String,
    /// Portal host, without port
    pub portal: String,
    pub port: String,
}

/// Everything the transport needs to attach one volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorRecord {
    pub volume_name: String,
    pub targets: Vec<TargetInfo>,
    pub target_iqn: String,
    pub target_portals: Vec<String>,
    pub lun: i32,
    pub multipath: bool,
    pub do_discovery: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_secrets: Option<ChapCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_secrets: Option<ChapCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator_name: Option<String>,
}

impl ConnectorRecord {
    /// Project a descriptor into a connector record
    pub fn assemble(descriptor: &ConnectionDescriptor, default_port: u16) -> Self {
        let targets = descriptor
            .portals()
            .iter()
            .map(|portal| {
                // A `]` after the last `:` means a bare bracketed IPv6 host.
                let (host, port) = match portal.rsplit_once(':') {
                    Some((host, port)) if !port.contains(']') => {
                        (host.to_string(), port.to_string())
                    }
                    _ => (portal.clone(), default_port.to_string()),
                };
                TargetInfo {
                    iqn: descriptor.target_name().to_string(),
                    portal: host,
                    port,
                }
            })
            .collect();

        // Discovery credentials are only forwarded alongside session ones.
        let session_secrets = descriptor.session_secret().cloned();
        let discovery_secrets = match (&session_secrets, descriptor.discovery_secret()) {
            (Some(_), Some(discovery)) => Some(discovery.clone()),
            (None, Some(_)) => {
                log::debug!(
                    "Dropping discovery CHAP for {}: no session CHAP configured",
                    descriptor.volume_name()
                );
                None
            }
            (_, None) => None,
        };

        Self {
            volume_name: descriptor.volume_name().to_string(),
            targets,
            target_iqn: descriptor.target_name().to_string(),
            target_portals: descriptor.portals().to_vec(),
            lun: descriptor.lun(),
            multipath: descriptor.portals().len() > 1,
            do_discovery: true,
            session_secrets,
            discovery_secrets,
            interface: descriptor.iscsi_interface().map(str::to_string),
            initiator_name: descriptor.initiator_name().map(str::to_string),
        }
    }

    /// Copy with CHAP passwords masked, for display
    pub fn redacted(&self) -> Self {
        Self {
            session_secrets: self.session_secrets.as_ref().map(ChapCredentials::redacted),
            discovery_secrets: self.discovery_secrets.as_ref().map(ChapCredentials::redacted),
            ..self.clone()
        }
    }
}

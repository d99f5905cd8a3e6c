//! Connection descriptor construction
//!
//! [`ConnectionDescriptor::build`] is the single validation gate for attach
//! requests. Everything downstream assumes a descriptor is well-formed.

use std::collections::HashMap;

use super::endpoint::parse_endpoint;
use super::portal::normalize_portal;
use super::secret::{extract_scope, parse_secret, ChapCredentials, CredentialScope};
use super::{AttachError, AttachResult};

/// Volume context keys read by [`RawContext::from_volume_context`]
pub mod keys {
    pub const TARGET_PORTAL: &str = "targetPortal";
    pub const IQN: &str = "iqn";
    pub const LUN: &str = "lun";
    pub const PORTALS: &str = "portals";
    pub const SECRET: &str = "secret";
    pub const ISCSI_INTERFACE: &str = "iscsiInterface";
    pub const INITIATOR_NAME: &str = "initiatorName";
    pub const DISCOVERY_CHAP_AUTH: &str = "discoveryCHAPAuth";
    pub const SESSION_CHAP_AUTH: &str = "sessionCHAPAuth";
}

/// Untyped attach parameters as supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawContext {
    pub target_portal: String,
    pub iqn: String,
    pub lun: String,
    /// Comma-separated portal list
    pub portals: String,
    /// Serialized credential blob
    pub secret: String,
    pub iscsi_interface: String,
    pub initiator_name: String,
    pub discovery_chap_auth: String,
    pub session_chap_auth: String,
}

impl RawContext {
    /// Read a CSI-style volume context. Absent keys read as empty.
    pub fn from_volume_context(context: &HashMap<String, String>) -> Self {
        let get = |key: &str| context.get(key).cloned().unwrap_or_default();

        Self {
            target_portal: get(keys::TARGET_PORTAL),
            iqn: get(keys::IQN),
            lun: get(keys::LUN),
            portals: get(keys::PORTALS),
            secret: get(keys::SECRET),
            iscsi_interface: get(keys::ISCSI_INTERFACE),
            initiator_name: get(keys::INITIATOR_NAME),
            discovery_chap_auth: get(keys::DISCOVERY_CHAP_AUTH),
            session_chap_auth: get(keys::SESSION_CHAP_AUTH),
        }
    }

    /// Fill portal, target and LUN from an `iscsi://` endpoint.
    /// The portal list holds the endpoint's portal alone.
    pub fn from_endpoint(endpoint: &str) -> AttachResult<Self> {
        let ep = parse_endpoint(endpoint)?;

        Ok(Self {
            portals: ep.portal.clone(),
            target_portal: ep.portal,
            iqn: ep.target,
            lun: ep.lun,
            ..Self::default()
        })
    }
}

/// Validated, immutable attach parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub(crate) volume_name: String,
    pub(crate) target_name: String,
    pub(crate) portals: Vec<String>,
    pub(crate) lun: i32,
    pub(crate) iscsi_interface: Option<String>,
    pub(crate) initiator_name: Option<String>,
    pub(crate) discovery_secret: Option<ChapCredentials>,
    pub(crate) session_secret: Option<ChapCredentials>,
    pub(crate) chap_discovery: bool,
    pub(crate) chap_session: bool,
}

impl ConnectionDescriptor {
    /// Validate `ctx` and build a descriptor for `volume_name`
    pub fn build(volume_name: &str, ctx: &RawContext, default_port: u16) -> AttachResult<Self> {
        let target_portal = ctx.target_portal.trim();
        let iqn = ctx.iqn.trim();
        let lun = ctx.lun.trim();
        if target_portal.is_empty() || iqn.is_empty() || lun.is_empty() {
            return Err(AttachError::MissingTargetInfo);
        }

        let listed: Vec<&str> = ctx
            .portals
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if listed.is_empty() {
            return Err(AttachError::NoPortalsProvided);
        }

        // Primary portal first; duplicates are left for the transport's
        // multipath handling.
        let mut portals = Vec::with_capacity(listed.len() + 1);
        portals.push(normalize_portal(target_portal, default_port));
        portals.extend(listed.iter().map(|p| normalize_portal(p, default_port)));

        let lun = lun.parse::<i32>().map_err(|source| AttachError::InvalidLun {
            value: lun.to_string(),
            source,
        })?;

        let secret = parse_secret(&ctx.secret);
        let session_secret = extract_scope(&secret, CredentialScope::Session)?;
        let discovery_secret = extract_scope(&secret, CredentialScope::Discovery)?;

        let descriptor = Self {
            volume_name: volume_name.to_string(),
            target_name: iqn.to_string(),
            portals,
            lun,
            iscsi_interface: non_empty(&ctx.iscsi_interface),
            initiator_name: non_empty(&ctx.initiator_name),
            discovery_secret,
            session_secret,
            chap_discovery: ctx.discovery_chap_auth == "true",
            chap_session: ctx.session_chap_auth == "true",
        };

        log::debug!(
            "Resolved volume {} -> {} lun {} via {} portal(s)",
            descriptor.volume_name,
            descriptor.target_name,
            descriptor.lun,
            descriptor.portals.len()
        );

        Ok(descriptor)
    }

    pub fn volume_name(&self) -> &str {
        &self.volume_name
    }

    /// Target IQN
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Normalized portals, primary first
    pub fn portals(&self) -> &[String] {
        &self.portals
    }

    pub fn lun(&self) -> i32 {
        self.lun
    }

    pub fn iscsi_interface(&self) -> Option<&str> {
        self.iscsi_interface.as_deref()
    }

    pub fn initiator_name(&self) -> Option<&str> {
        self.initiator_name.as_deref()
    }

    pub fn discovery_secret(&self) -> Option<&ChapCredentials> {
        self.discovery_secret.as_ref()
    }

    pub fn session_secret(&self) -> Option<&ChapCredentials> {
        self.session_secret.as_ref()
    }

    /// Whether discovery CHAP was requested, independent of credentials
    pub fn chap_discovery(&self) -> bool {
        self.chap_discovery
    }

    /// Whether session CHAP was requested, independent of credentials
    pub fn chap_session(&self) -> bool {
        self.chap_session
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

//! iSCSI attach parameter resolution
//!
//! Turns untyped volume-publish parameters into a validated
//! [`ConnectionDescriptor`], the [`ConnectorRecord`] handed to the transport,
//! and the mount/unmount bundles consumed by the node workflow.

pub mod bundle;
pub mod connector;
pub mod descriptor;
pub mod endpoint;
pub mod portal;
pub mod secret;

pub use bundle::{build_mount_bundle, build_unmount_bundle, MountBundle, UnmountBundle};
pub use connector::{ConnectorRecord, TargetInfo};
pub use descriptor::{ConnectionDescriptor, RawContext};
pub use endpoint::{parse_endpoint, Endpoint};
pub use portal::{normalize_portal, DEFAULT_PORT};
pub use secret::{extract_scope, parse_secret, ChapCredentials, CredentialScope};

use std::num::ParseIntError;
use thiserror::Error;

/// Attach parameter errors
///
/// All of these are terminal for the request that produced them.
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("malformed iSCSI endpoint: {0}")]
    MalformedEndpoint(String),

    #[error("iSCSI target information is missing")]
    MissingTargetInfo,

    #[error("no portals provided")]
    NoPortalsProvided,

    #[error("invalid LUN {value:?}: {source}")]
    InvalidLun {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("{field} not found in {scope} secret")]
    IncompleteCredentialScope {
        scope: CredentialScope,
        field: &'static str,
    },
}

/// Result type for attach parameter resolution
pub type AttachResult<T> = Result<T, AttachError>;

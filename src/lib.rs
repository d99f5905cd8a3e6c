//! iSCSI volume attach parameter resolution
//!
//! This crate validates the untyped parameters a storage orchestrator hands a
//! node plugin, resolves them into an immutable connection descriptor and a
//! transport connector record, and drives the external transport and mount
//! collaborators with the resulting bundles.

pub mod config;
pub mod iscsi;
pub mod node;

pub use config::Config;
pub use iscsi::{AttachError, ConnectionDescriptor, ConnectorRecord, RawContext};
pub use node::{AttachSettings, Mounter, NodeAttacher, PublishRequest, Transport};

//! iSCSI endpoint string parsing
//!
//! Endpoints have the form `iscsi://<portal>/<target-name>/<lun>`.

use super::{AttachError, AttachResult};

/// Scheme prefix every endpoint must carry
pub const ENDPOINT_SCHEME: &str = "iscsi://";

/// The three fields of an endpoint, unnormalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub portal: String,
    pub target: String,
    pub lun: String,
}

/// Split an endpoint into portal, target name and LUN
pub fn parse_endpoint(endpoint: &str) -> AttachResult<Endpoint> {
    let rest = endpoint.strip_prefix(ENDPOINT_SCHEME).ok_or_else(|| {
        AttachError::MalformedEndpoint(format!("endpoint does not start with {}", ENDPOINT_SCHEME))
    })?;

    let toks: Vec<&str> = rest.split('/').collect();
    if toks.len() != 3 {
        return Err(AttachError::MalformedEndpoint(format!(
            "expected 3 segments after {}, got {}",
            ENDPOINT_SCHEME,
            toks.len()
        )));
    }

    Ok(Endpoint {
        portal: toks[0].to_string(),
        target: toks[1].to_string(),
        lun: toks[2].to_string(),
    })
}

//! CHAP secret extraction
//!
//! The credential blob is a JSON object of strings. It may carry a session
//! scope (`node.session.auth.*`), a discovery scope
//! (`node.sendtargets.auth.*`), or both.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::{AttachError, AttachResult};

/// Secrets type recorded on every extracted scope
pub const CHAP_SECRETS_TYPE: &str = "chap";

/// Authentication phase a set of CHAP credentials applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialScope {
    /// SendTargets discovery
    Discovery,
    /// Session login
    Session,
}

impl CredentialScope {
    /// Secret keys for this scope, in the order they are checked:
    /// username, password, username_in, password_in
    pub fn field_names(self) -> [&'static str; 4] {
        match self {
            CredentialScope::Session => [
                "node.session.auth.username",
                "node.session.auth.password",
                "node.session.auth.username_in",
                "node.session.auth.password_in",
            ],
            CredentialScope::Discovery => [
                "node.sendtargets.auth.username",
                "node.sendtargets.auth.password",
                "node.sendtargets.auth.username_in",
                "node.sendtargets.auth.password_in",
            ],
        }
    }
}

impl fmt::Display for CredentialScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialScope::Discovery => write!(f, "discovery"),
            CredentialScope::Session => write!(f, "session"),
        }
    }
}

/// One fully populated CHAP scope
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapCredentials {
    pub secrets_type: String,
    pub user_name: String,
    pub password: String,
    pub user_name_in: String,
    pub password_in: String,
}

impl ChapCredentials {
    /// Copy with both passwords masked, for display
    pub fn redacted(&self) -> Self {
        Self {
            password: REDACTED.to_string(),
            password_in: REDACTED.to_string(),
            ..self.clone()
        }
    }
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for ChapCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChapCredentials")
            .field("secrets_type", &self.secrets_type)
            .field("user_name", &self.user_name)
            .field("password", &REDACTED)
            .field("user_name_in", &self.user_name_in)
            .field("password_in", &REDACTED)
            .finish()
    }
}

/// Decode a credential blob.
///
/// A blob that is not a JSON object of strings (including the empty string)
/// decodes to an empty map, exactly as if no credentials were supplied.
pub fn parse_secret(blob: &str) -> HashMap<String, String> {
    match serde_json::from_str(blob) {
        Ok(secret) => secret,
        Err(e) => {
            if !blob.is_empty() {
                log::debug!("Ignoring undecodable secret blob: {}", e);
            }
            HashMap::new()
        }
    }
}

/// Project a decoded secret into one credential scope.
///
/// Returns `None` for an empty secret. A non-empty secret must carry all four
/// keys of the scope.
pub fn extract_scope(
    secret: &HashMap<String, String>,
    scope: CredentialScope,
) -> AttachResult<Option<ChapCredentials>> {
    if secret.is_empty() {
        return Ok(None);
    }

    let [user_name, password, user_name_in, password_in] = scope.field_names().map(|field| {
        secret
            .get(field)
            .cloned()
            .ok_or(AttachError::IncompleteCredentialScope { scope, field })
    });

    Ok(Some(ChapCredentials {
        secrets_type: CHAP_SECRETS_TYPE.to_string(),
        user_name: user_name?,
        password: password?,
        user_name_in: user_name_in?,
        password_in: password_in?,
    }))
}

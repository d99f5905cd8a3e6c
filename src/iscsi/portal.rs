//! Portal address normalization

/// Well-known iSCSI port
pub const DEFAULT_PORT: u16 = 3260;

/// Append `default_port` to a portal that carries no port
pub fn normalize_portal(portal: &str, default_port: u16) -> String {
    if portal.contains(':') {
        portal.to_string()
    } else {
        format!("{}:{}", portal, default_port)
    }
}

//! Environment-dependent candidate selection.
//!
//! A page served from a static-hosting domain talks to the deployed
//! backends; anything else is treated as local development.

use crate::config::schema::BackendsConfig;

/// Which candidate list a host maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Remote,
    Local,
}

/// Classify a host name against the static-hosting marker.
pub fn environment_for_host(host: &str, marker: &str) -> Environment {
    if !marker.is_empty() && host.to_ascii_lowercase().contains(&marker.to_ascii_lowercase()) {
        Environment::Remote
    } else {
        Environment::Local
    }
}

/// Return the ordered candidate URLs for `host`.
pub fn candidates_for_host<'a>(backends: &'a BackendsConfig, host: &str) -> &'a [String] {
    match environment_for_host(host, &backends.static_host_marker) {
        Environment::Remote => &backends.remote,
        Environment::Local => &backends.local,
    }
}

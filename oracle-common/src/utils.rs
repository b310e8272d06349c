//! utils.rs
//!
//! Common types shared across the oracle crates.
//!
//! This module provides the peer address identity used by the membership
//! registry, the peer client and the round coordinator.

use serde::{Deserialize, Serialize};

/// Address of a node in the oracle network (scheme + host + port).
///
/// `PeerAddress` is a lightweight wrapper around `String`:
/// - Equality is exact string match, no normalisation is applied
/// - Usable as `HashMap`/`HashSet` key
/// - Serialises as a plain JSON string
#[derive(Default, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerAddress(pub String);

impl PeerAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        PeerAddress(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Joins an endpoint path onto the address, e.g. `/sync`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.0.trim_end_matches('/'), path)
    }
}

impl std::fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PeerAddress {
    fn from(s: &str) -> Self {
        PeerAddress(s.to_string())
    }
}

impl From<String> for PeerAddress {
    fn from(s: String) -> Self {
        PeerAddress(s)
    }
}

use std::time::Duration;

use oracle_common::{OracleError, PeerAddress};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Request to {peer} timed out after {timeout:?}")]
    Timeout { peer: PeerAddress, timeout: Duration },

    #[error("Peer {peer} unreachable: {reason}")]
    Unreachable { peer: PeerAddress, reason: String },

    #[error("Peer {peer} answered with status {status}: {body}")]
    Status { peer: PeerAddress, status: u16, body: String },

    #[error("Malformed response from {peer}: {reason}")]
    Malformed { peer: PeerAddress, reason: String },
}

impl NetworkError {
    pub fn peer(&self) -> &PeerAddress {
        match self {
            NetworkError::Timeout { peer, .. }
            | NetworkError::Unreachable { peer, .. }
            | NetworkError::Status { peer, .. }
            | NetworkError::Malformed { peer, .. } => peer,
        }
    }
}

impl From<NetworkError> for OracleError {
    fn from(err: NetworkError) -> Self {
        OracleError::PeerUnreachable {
            peer: err.peer().to_string(),
            reason: err.to_string(),
        }
    }
}

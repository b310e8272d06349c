use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    /// Seed peer unreachable or malformed at boot; the process must abort.
    #[error("Startup failed: {0}")]
    StartupFatal(String),

    #[error("Peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: String, reason: String },

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Price source error: {0}")]
    PriceSource(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OracleError {
    /// True for errors caused by the caller's input rather than this node.
    pub fn is_client_error(&self) -> bool {
        matches!(self, OracleError::MalformedRequest(_))
    }
}

use async_trait::async_trait;

use oracle_common::{
    message::{MedianPush, MemberList, PushReply},
    OracleError, PeerAddress,
};

use crate::error::NetworkError;

/// Outbound calls to other nodes. Every call is bounded by the
/// implementation's own timeout and fails independently of the others.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Registers `caller` on `peer` and returns the peer's member list.
    async fn request_members(&self, peer: &PeerAddress, caller: &PeerAddress) -> Result<MemberList, NetworkError>;

    /// Asks `peer` for its own local estimate.
    async fn pull_answer(&self, peer: &PeerAddress, caller: &PeerAddress) -> Result<f64, NetworkError>;

    /// Pushes an agreed median to `peer`.
    async fn push_median(&self, peer: &PeerAddress, caller: &PeerAddress, value: f64) -> Result<PushReply, NetworkError>;
}

/// Inbound surface of a node, shared by the HTTP router and the in-memory
/// network used in tests.
#[async_trait]
pub trait PeerService: Send + Sync {
    async fn on_sync(&self, caller: PeerAddress) -> Result<MemberList, OracleError>;

    async fn on_pull_answer(&self, caller: Option<PeerAddress>) -> Result<f64, OracleError>;

    async fn on_push_median(&self, push: MedianPush) -> Result<PushReply, OracleError>;
}

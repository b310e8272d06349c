//! One oracle node: membership, round coordinator and the two ports it talks
//! through (outbound [`PeerClient`], local [`PriceSource`]).
//!
//! Inbound handlers live in `inbound`, the leader side of a round in
//! `rounds`.

mod inbound;
mod rounds;

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use oracle_common::{message::MemberList, OracleError, PeerAddress};
use oracle_consensus::{
    round::RoundSnapshot, ChangeGate, PriceSource, QuorumPolicy, RoundCoordinator,
};
use oracle_p2p::{join::flood_join, MembershipRegistry, PeerClient, SharedMembership};

use crate::config::NodeConfig;

pub use rounds::TickOutcome;

pub struct OracleNode {
    pub config: NodeConfig,
    pub local: PeerAddress,
    pub membership: SharedMembership,
    pub coordinator: RoundCoordinator,
    pub client: Arc<dyn PeerClient>,
    pub price: Arc<dyn PriceSource>,
}

/// Served on `GET /status`.
#[derive(Debug, Clone, Serialize)]
pub struct NodeStatus {
    pub node: PeerAddress,
    pub members: MemberList,
    pub required_answers: usize,
    pub diff_threshold: f64,
    pub price_source: String,
    pub round: RoundSnapshot,
}

impl OracleNode {
    pub fn new(config: NodeConfig, client: Arc<dyn PeerClient>, price: Arc<dyn PriceSource>) -> Self {
        let local = config.self_address();
        let coordinator = RoundCoordinator::new(
            ChangeGate::new(config.diff_threshold),
            QuorumPolicy::default(),
            config.round_timeout(),
        );

        Self {
            membership: MembershipRegistry::shared(local.clone()),
            local,
            coordinator,
            client,
            price,
            config,
        }
    }

    /// Joins through the configured seed, if any. Returns the member count.
    ///
    /// A seed that cannot be reached is fatal; nodes without a seed start
    /// alone and wait for others to sync to them.
    pub async fn bootstrap(&self) -> Result<usize, OracleError> {
        let Some(seed) = self.config.seed() else {
            info!("🌱 No seed configured, starting a new network as {}", self.local);
            return Ok(1);
        };

        let members = flood_join(self.client.as_ref(), &self.local, &seed).await?;

        let mut registry = self.membership.write().await;
        registry.merge(members);
        Ok(registry.len())
    }

    pub async fn members(&self) -> MemberList {
        self.membership.read().await.snapshot()
    }

    pub async fn status(&self) -> NodeStatus {
        let members = self.members().await;
        NodeStatus {
            node: self.local.clone(),
            required_answers: self.coordinator.policy().required(members.len()),
            members,
            diff_threshold: self.coordinator.gate().threshold,
            price_source: self.price.name().to_string(),
            round: self.coordinator.snapshot().await,
        }
    }
}

use async_trait::async_trait;
use tracing::{debug, info, warn};

use oracle_common::{
    message::{MedianPush, MemberList, PushReply},
    OracleError, PeerAddress,
};
use oracle_consensus::round::ContributeOutcome;
use oracle_p2p::PeerService;

use super::OracleNode;

#[async_trait]
impl PeerService for OracleNode {
    async fn on_sync(&self, caller: PeerAddress) -> Result<MemberList, OracleError> {
        if caller.as_str().trim().is_empty() {
            return Err(OracleError::MalformedRequest("sync request without node".into()));
        }

        let mut registry = self.membership.write().await;
        let known = registry.contains(&caller);
        let members = registry.register_sync(caller.clone());
        drop(registry);

        if !known {
            info!("🤝 {} joined, {} members known", caller, members.len());
        }
        tracing::info!(target: "consensus", "EVENT:SYNC from={} new={} members={}", caller, !known, members.len());
        Ok(members)
    }

    async fn on_pull_answer(&self, caller: Option<PeerAddress>) -> Result<f64, OracleError> {
        let caller = caller
            .filter(|c| !c.as_str().trim().is_empty())
            .ok_or_else(|| OracleError::MalformedRequest("missing node parameter".into()))?;

        if !self.membership.read().await.contains(&caller) {
            warn!("🚫 Answer requested by unknown node {}", caller);
            return Err(OracleError::MalformedRequest("Invalid node".into()));
        }

        let value = self.price.local_estimate().await?;
        debug!("Answering {} with {}", caller, value);
        Ok(value)
    }

    async fn on_push_median(&self, push: MedianPush) -> Result<PushReply, OracleError> {
        if !push.value.is_finite() {
            return Err(OracleError::MalformedRequest(format!("non-finite median {}", push.value)));
        }

        let members = self.membership.read().await.len();
        debug!("Median {} pushed by {}", push.value, push.node);

        match self.coordinator.contribute(push.value, members).await {
            ContributeOutcome::Opened { .. } => match self.price.local_estimate().await {
                Ok(value) => Ok(PushReply::Answer { value }),
                Err(e) => {
                    warn!("⚠️ Could not attach own estimate to push reply: {}", e);
                    Ok(PushReply::Ack)
                }
            },
            ContributeOutcome::Joined(_) | ContributeOutcome::Skipped { .. } => Ok(PushReply::Ack),
        }
    }
}

use std::sync::Arc;

use futures::{future::join_all, stream::FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use oracle_common::{message::PushReply, PeerAddress};
use oracle_consensus::round::{BeginOutcome, RecordOutcome, RoundId, RoundResult};

use super::OracleNode;

/// What one trigger tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A round was already collecting.
    Busy,
    /// The local price source failed; nothing was started.
    EstimateFailed,
    /// The local estimate is within the threshold of the last published value.
    Unchanged { estimate: f64 },
    InsufficientMembership { members: usize, required: usize },
    /// The fan-out ended below quorum.
    Abandoned { round: RoundId, answers: usize },
    /// Pushed medians reached quorum before the fan-out finished.
    Superseded { round: RoundId },
    Completed(RoundResult),
}

impl OracleNode {
    /// Runs one trigger tick: gate the local estimate, then lead a round.
    pub async fn tick(&self) -> TickOutcome {
        if self.coordinator.is_collecting().await {
            debug!("Round in progress, skipping tick");
            return TickOutcome::Busy;
        }

        let estimate = match self.price.local_estimate().await {
            Ok(value) => value,
            Err(e) => {
                warn!("⚠️ Local estimate from {} failed, skipping tick: {}", self.price.name(), e);
                return TickOutcome::EstimateFailed;
            }
        };

        if !self.coordinator.passes_gate(estimate).await {
            debug!("Estimate {} close to last published value, no round", estimate);
            return TickOutcome::Unchanged { estimate };
        }

        let (members, peers) = {
            let registry = self.membership.read().await;
            (registry.len(), registry.peers())
        };

        let round = match self.coordinator.begin_local(members).await {
            BeginOutcome::Started { round, .. } => round,
            BeginOutcome::Busy(_) => return TickOutcome::Busy,
            BeginOutcome::InsufficientMembership { members, required } => {
                info!("⏳ Not enough nodes ({} of {}), waiting", members, required);
                return TickOutcome::InsufficientMembership { members, required };
            }
        };

        let (result, answers) = self.collect_answers(round, &peers).await;

        match result {
            Some(result) => {
                if result.published {
                    self.push_median(result.median).await;
                }
                TickOutcome::Completed(result)
            }
            None if self.coordinator.abandon(round).await => TickOutcome::Abandoned { round, answers },
            None => TickOutcome::Superseded { round },
        }
    }

    /// Pulls an answer from every peer concurrently, feeding each one to the
    /// coordinator as it arrives. Failed peers are logged and left out.
    ///
    /// The fan-out is drained even after quorum so no request is dropped
    /// mid-flight; later answers are simply not recorded.
    async fn collect_answers(&self, round: RoundId, peers: &[PeerAddress]) -> (Option<RoundResult>, usize) {
        let limiter = self.config.max_in_flight.map(|n| Arc::new(Semaphore::new(n.max(1))));

        let mut calls: FuturesUnordered<_> = peers
            .iter()
            .map(|peer| {
                let limiter = limiter.clone();
                async move {
                    let _permit = match &limiter {
                        Some(sem) => sem.acquire().await.ok(),
                        None => None,
                    };
                    (peer, self.client.pull_answer(peer, &self.local).await)
                }
            })
            .collect();

        let mut result = None;
        let mut answers = 0;

        while let Some((peer, reply)) = calls.next().await {
            match reply {
                Ok(value) => {
                    answers += 1;
                    debug!("Answer {} from {}", value, peer);
                    if result.is_some() {
                        continue;
                    }
                    if let RecordOutcome::Completed(done) = self.coordinator.record_answer(round, value).await {
                        result = Some(done);
                    }
                }
                Err(e) => {
                    warn!("⚠️ Excluding {} from round {}: {}", peer, round, e);
                    tracing::info!(target: "consensus", "EVENT:EXCLUDE round={} peer={}", round.0, peer);
                }
            }
        }

        (result, answers)
    }

    /// Sends a published median to every known peer.
    async fn push_median(&self, value: f64) {
        let peers = self.membership.read().await.peers();
        info!("📤 Pushing median {} to {} peers", value, peers.len());

        let replies = join_all(peers.iter().map(|peer| self.client.push_median(peer, &self.local, value))).await;

        for (peer, reply) in peers.iter().zip(replies) {
            match reply {
                Ok(PushReply::Ack) => debug!("{} acknowledged median", peer),
                Ok(PushReply::Answer { value }) => debug!("{} opened a round, own estimate {}", peer, value),
                Err(e) => warn!("⚠️ Push to {} failed: {}", peer, e),
            }
        }
    }
}

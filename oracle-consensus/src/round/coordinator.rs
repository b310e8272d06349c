use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::state::{
    BeginOutcome, ContributeOutcome, Published, RecordOutcome, RoundId, RoundOrigin, RoundResult, RoundState,
    RoundStatus,
};
use crate::{gate::ChangeGate, quorum::QuorumPolicy};

/// Point-in-time view of the coordinator, used by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RoundSnapshot {
    pub collecting: bool,
    pub round: Option<RoundId>,
    pub origin: Option<RoundOrigin>,
    pub answers: usize,
    pub quorum: Option<usize>,
    pub last_published: Option<Published>,
}

/// Serialises every access to the node's round state through one lock.
///
/// Methods never await anything but the lock itself, so callers can hold no
/// guard while talking to the network.
pub struct RoundCoordinator {
    state: Mutex<RoundState>,
    gate: ChangeGate,
    policy: QuorumPolicy,
    round_timeout: Option<Duration>,
}

impl RoundCoordinator {
    pub fn new(gate: ChangeGate, policy: QuorumPolicy, round_timeout: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(RoundState::new()),
            gate,
            policy,
            round_timeout,
        }
    }

    pub fn gate(&self) -> ChangeGate {
        self.gate
    }

    pub fn policy(&self) -> QuorumPolicy {
        self.policy
    }

    fn expire_stale(&self, state: &mut RoundState) {
        if let Some(timeout) = self.round_timeout {
            if let Some(round) = state.expire(Instant::now(), timeout) {
                warn!("⌛ Round {} exceeded {:?} without quorum, resetting", round, timeout);
                tracing::info!(target: "consensus", "EVENT:ROUND_EXPIRED round={}", round.0);
            }
        }
    }

    pub async fn is_collecting(&self) -> bool {
        let mut state = self.state.lock().await;
        self.expire_stale(&mut state);
        state.status().is_collecting()
    }

    pub async fn last_published(&self) -> Option<Published> {
        self.state.lock().await.last_published().cloned()
    }

    /// Whether `candidate` differs enough from the last published value.
    pub async fn passes_gate(&self, candidate: f64) -> bool {
        let last = self.state.lock().await.last_value();
        self.gate.should_publish(last, candidate)
    }

    /// Opens a round from the local trigger loop.
    pub async fn begin_local(&self, members: usize) -> BeginOutcome {
        let mut state = self.state.lock().await;
        self.expire_stale(&mut state);

        let outcome = state.begin(members, RoundOrigin::Local, &self.policy, Instant::now());
        match &outcome {
            BeginOutcome::Started { round, quorum } => {
                info!("🗳️ Round {} started (members: {}, quorum: {})", round, members, quorum);
                tracing::info!(target: "consensus", "EVENT:ROUND_START round={} origin=local members={} quorum={}", round.0, members, quorum);
            }
            BeginOutcome::Busy(round) => debug!("Round {} still collecting, not starting another", round),
            BeginOutcome::InsufficientMembership { members, required } => {
                debug!("Not enough nodes to start a round ({} < {})", members, required)
            }
        }
        outcome
    }

    /// Adds a pulled answer to `round`.
    pub async fn record_answer(&self, round: RoundId, value: f64) -> RecordOutcome {
        let outcome = self.state.lock().await.record(round, value, &self.gate);
        self.log_record(&outcome, value);
        outcome
    }

    /// Handles a pushed median: opens a remote round when idle, otherwise
    /// counts the value towards the round in progress.
    pub async fn contribute(&self, value: f64, members: usize) -> ContributeOutcome {
        let mut state = self.state.lock().await;
        self.expire_stale(&mut state);

        let outcome = state.contribute(value, members, &self.policy, &self.gate, Instant::now());
        drop(state);

        match &outcome {
            ContributeOutcome::Opened { round, outcome } => {
                info!("🗳️ Round {} opened by pushed median {}", round, value);
                tracing::info!(target: "consensus", "EVENT:ROUND_START round={} origin=remote members={}", round.0, members);
                self.log_record(outcome, value);
            }
            ContributeOutcome::Joined(outcome) => self.log_record(outcome, value),
            ContributeOutcome::Skipped { members, required } => {
                debug!("Ignoring pushed median, not enough nodes ({} < {})", members, required)
            }
        }
        outcome
    }

    /// Ends `round` without a result (fan-out finished below quorum).
    pub async fn abandon(&self, round: RoundId) -> bool {
        let abandoned = self.state.lock().await.abandon(round);
        if abandoned {
            warn!("❌ Round {} closed without quorum", round);
            tracing::info!(target: "consensus", "EVENT:ROUND_ABORT round={}", round.0);
        }
        abandoned
    }

    pub async fn snapshot(&self) -> RoundSnapshot {
        let state = self.state.lock().await;
        let (round, origin, quorum) = match state.status() {
            RoundStatus::Collecting { round, origin, quorum, .. } => (Some(round), Some(origin), Some(quorum)),
            RoundStatus::Idle => (None, None, None),
        };

        RoundSnapshot {
            collecting: state.status().is_collecting(),
            round,
            origin,
            answers: state.answers().len(),
            quorum,
            last_published: state.last_published().cloned(),
        }
    }

    fn log_record(&self, outcome: &RecordOutcome, value: f64) {
        match outcome {
            RecordOutcome::Pending { round, collected, quorum } => {
                tracing::info!(target: "consensus", "EVENT:ANSWER round={} value={} collected={} quorum={}", round.0, value, collected, quorum);
            }
            RecordOutcome::Completed(result) => self.log_completion(result),
            RecordOutcome::Stale => debug!("Discarding stale answer {}", value),
        }
    }

    fn log_completion(&self, result: &RoundResult) {
        info!("📊 Answers: {:?}", result.answers);
        info!("✅ Round {} complete, median {}", result.round, result.median);
        tracing::info!(target: "consensus", "EVENT:ROUND_COMPLETE round={} median={} answers={}", result.round.0, result.median, result.answers.len());

        if result.published {
            info!("📢 Median changed by more than {}%: {:?} -> {}", self.gate.threshold * 100.0, result.previous, result.median);
            tracing::info!(target: "consensus", "EVENT:PUBLISH round={} value={}", result.round.0, result.median);
        } else {
            debug!("Median {} within {}% of {:?}, not publishing", result.median, self.gate.threshold * 100.0, result.previous);
            tracing::info!(target: "consensus", "EVENT:SUPPRESS round={} value={}", result.round.0, result.median);
        }
    }
}

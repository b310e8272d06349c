use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{Duration, Instant};

use crate::{gate::ChangeGate, median::lower_median, quorum::QuorumPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RoundId(pub u64);

impl std::fmt::Display for RoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who opened the round: our own trigger loop or an inbound median push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundOrigin {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundStatus {
    Idle,
    Collecting {
        round: RoundId,
        origin: RoundOrigin,
        quorum: usize,
        started_at: Instant,
    },
}

impl RoundStatus {
    pub fn is_collecting(&self) -> bool {
        matches!(self, RoundStatus::Collecting { .. })
    }
}

/// Value agreed by a completed round that passed the change gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Published {
    pub value: f64,
    pub round: RoundId,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    pub round: RoundId,
    pub origin: RoundOrigin,
    pub median: f64,
    /// Answers the median was taken from, in arrival order.
    pub answers: Vec<f64>,
    pub previous: Option<f64>,
    pub published: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BeginOutcome {
    Started { round: RoundId, quorum: usize },
    Busy(RoundId),
    InsufficientMembership { members: usize, required: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Pending { round: RoundId, collected: usize, quorum: usize },
    Completed(RoundResult),
    /// The answer belongs to a round that is no longer collecting.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContributeOutcome {
    /// The value opened a new round on this node.
    Opened { round: RoundId, outcome: RecordOutcome },
    /// The value was added to the round already in progress.
    Joined(RecordOutcome),
    Skipped { members: usize, required: usize },
}

/// Round status, collected answers and last published value of one node.
///
/// The three are only ever mutated together through `&mut self`; the
/// coordinator keeps this behind a single lock.
#[derive(Debug)]
pub struct RoundState {
    status: RoundStatus,
    answers: Vec<f64>,
    last_published: Option<Published>,
    next_round: u64,
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundState {
    pub fn new() -> Self {
        Self {
            status: RoundStatus::Idle,
            answers: Vec::new(),
            last_published: None,
            next_round: 1,
        }
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn answers(&self) -> &[f64] {
        &self.answers
    }

    pub fn last_published(&self) -> Option<&Published> {
        self.last_published.as_ref()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.last_published.as_ref().map(|p| p.value)
    }

    pub fn begin(
        &mut self,
        members: usize,
        origin: RoundOrigin,
        policy: &QuorumPolicy,
        now: Instant,
    ) -> BeginOutcome {
        if let RoundStatus::Collecting { round, .. } = self.status {
            return BeginOutcome::Busy(round);
        }

        if !policy.allows_round(members) {
            return BeginOutcome::InsufficientMembership {
                members,
                required: policy.min_members,
            };
        }

        let round = RoundId(self.next_round);
        self.next_round += 1;
        let quorum = policy.required(members).max(1);

        self.answers.clear();
        self.status = RoundStatus::Collecting { round, origin, quorum, started_at: now };

        BeginOutcome::Started { round, quorum }
    }

    /// Adds an answer to `round`. Reaching quorum closes the round: the
    /// median is computed, gated against the last published value and the
    /// state returns to `Idle` with an empty collection.
    pub fn record(&mut self, round: RoundId, value: f64, gate: &ChangeGate) -> RecordOutcome {
        let (current, origin, quorum) = match self.status {
            RoundStatus::Collecting { round, origin, quorum, .. } => (round, origin, quorum),
            RoundStatus::Idle => return RecordOutcome::Stale,
        };
        if current != round {
            return RecordOutcome::Stale;
        }

        self.answers.push(value);
        if self.answers.len() < quorum {
            return RecordOutcome::Pending {
                round,
                collected: self.answers.len(),
                quorum,
            };
        }

        let answers = std::mem::take(&mut self.answers);
        self.status = RoundStatus::Idle;

        // quorum >= 1, so the collection is never empty here
        let median = lower_median(&answers).unwrap_or(value);
        let previous = self.last_value();
        let published = gate.should_publish(previous, median);

        if published {
            self.last_published = Some(Published {
                value: median,
                round,
                at: Utc::now(),
            });
        }

        RecordOutcome::Completed(RoundResult {
            round,
            origin,
            median,
            answers,
            previous,
            published,
        })
    }

    /// Opens a round if idle, then records `value` in whichever round is
    /// collecting. Both steps happen under the same `&mut self`.
    pub fn contribute(
        &mut self,
        value: f64,
        members: usize,
        policy: &QuorumPolicy,
        gate: &ChangeGate,
        now: Instant,
    ) -> ContributeOutcome {
        match self.status {
            RoundStatus::Collecting { round, .. } => ContributeOutcome::Joined(self.record(round, value, gate)),
            RoundStatus::Idle => match self.begin(members, RoundOrigin::Remote, policy, now) {
                BeginOutcome::Started { round, .. } => ContributeOutcome::Opened {
                    round,
                    outcome: self.record(round, value, gate),
                },
                BeginOutcome::InsufficientMembership { members, required } => {
                    ContributeOutcome::Skipped { members, required }
                }
                BeginOutcome::Busy(round) => ContributeOutcome::Joined(self.record(round, value, gate)),
            },
        }
    }

    /// Closes `round` without a result. Returns false if it was not the
    /// collecting round.
    pub fn abandon(&mut self, round: RoundId) -> bool {
        match self.status {
            RoundStatus::Collecting { round: current, .. } if current == round => {
                self.status = RoundStatus::Idle;
                self.answers.clear();
                true
            }
            _ => false,
        }
    }

    /// Resets a push-opened round that has been collecting for longer than
    /// `timeout`. Local rounds are always closed by the fan-out that opened
    /// them and never expire here.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> Option<RoundId> {
        match self.status {
            RoundStatus::Collecting { round, origin: RoundOrigin::Remote, started_at, .. }
                if now.duration_since(started_at) >= timeout =>
            {
                self.abandon(round);
                Some(round)
            }
            _ => None,
        }
    }
}

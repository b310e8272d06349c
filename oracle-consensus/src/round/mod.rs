//! Round coordination.
//!
//! A round moves `Idle -> Collecting -> Idle`. It is opened either by the
//! local trigger loop (answers are then pulled from peers) or by an inbound
//! median push (answers are further pushes). It closes once
//! `floor(members / 3) * 2` answers were collected, when the local fan-out
//! ends below quorum, or when it outlives the round deadline.

pub mod coordinator;
pub mod state;

pub use coordinator::{RoundCoordinator, RoundSnapshot};
pub use state::{
    BeginOutcome, ContributeOutcome, Published, RecordOutcome, RoundId, RoundOrigin, RoundResult, RoundStatus,
};

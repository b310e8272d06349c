//! Wire payloads exchanged between oracle nodes.
//!
//! All bodies are JSON. The membership list travels as a bare array of
//! address strings and a pulled answer as a bare JSON number.

use serde::{Deserialize, Serialize};

use crate::utils::PeerAddress;

pub type MemberList = Vec<PeerAddress>;

/// Body of `POST /sync`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub node: PeerAddress,
}

/// Query string of `GET /answer`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerQuery {
    pub node: Option<PeerAddress>,
}

/// Body of `POST /median`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianPush {
    pub node: PeerAddress,
    pub value: f64,
}

/// Reply to a median push: either a bare acknowledgement or the receiver's
/// own estimate when the push opened a new round on its side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PushReply {
    Ack,
    Answer { value: f64 },
}

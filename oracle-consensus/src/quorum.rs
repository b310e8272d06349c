use serde::{Deserialize, Serialize};

/// Membership requirements for running a round.
///
/// A round needs `floor(members / 3) * 2` answers and at least
/// `min_members` known members to start at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumPolicy {
    pub min_members: usize,
}

impl Default for QuorumPolicy {
    fn default() -> Self {
        Self { min_members: 3 }
    }
}

impl QuorumPolicy {
    /// Answers needed to close a round over `members` known nodes.
    pub fn required(&self, members: usize) -> usize {
        (members / 3) * 2
    }

    pub fn allows_round(&self, members: usize) -> bool {
        members >= self.min_members
    }
}

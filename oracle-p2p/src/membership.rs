use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;

use oracle_common::{message::MemberList, PeerAddress};

pub type SharedMembership = Arc<RwLock<MembershipRegistry>>;

/// Known members of the oracle network, the local node included.
///
/// Grows through flood join and inbound sync requests. There is no removal:
/// a member that goes away stays listed and is simply excluded from the
/// rounds it fails to answer.
#[derive(Clone, Debug)]
pub struct MembershipRegistry {
    local: PeerAddress,
    members: HashSet<PeerAddress>,
}

impl MembershipRegistry {
    pub fn new(local: PeerAddress) -> Self {
        let mut members = HashSet::new();
        members.insert(local.clone());
        Self { local, members }
    }

    pub fn shared(local: PeerAddress) -> SharedMembership {
        Arc::new(RwLock::new(Self::new(local)))
    }

    /// Adds `addr` if it is not known yet. Returns whether it was new.
    pub fn register(&mut self, addr: PeerAddress) -> bool {
        self.members.insert(addr)
    }

    /// Registers the caller and answers with the full member list.
    pub fn register_sync(&mut self, caller: PeerAddress) -> MemberList {
        self.register(caller);
        self.snapshot()
    }

    /// Merges a batch of addresses, returning how many were new.
    pub fn merge<I>(&mut self, addrs: I) -> usize
    where
        I: IntoIterator<Item = PeerAddress>,
    {
        addrs.into_iter().filter(|addr| self.register(addr.clone())).count()
    }

    pub fn contains(&self, addr: &PeerAddress) -> bool {
        self.members.contains(addr)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// All members, sorted so that listings are stable across calls.
    pub fn snapshot(&self) -> MemberList {
        let mut list: Vec<PeerAddress> = self.members.iter().cloned().collect();
        list.sort();
        list
    }

    /// Fan-out targets: every member except the local node.
    pub fn peers(&self) -> Vec<PeerAddress> {
        let mut list: Vec<PeerAddress> = self.members
            .iter()
            .filter(|addr| **addr != self.local)
            .cloned()
            .collect();
        list.sort();
        list
    }
}

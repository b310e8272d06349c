pub mod adapter;
pub mod error;
pub mod in_memory;
pub mod join;
pub mod membership;
pub mod ports;

pub use adapter::HttpPeerClient;
pub use error::NetworkError;
pub use membership::{MembershipRegistry, SharedMembership};
pub use ports::{PeerClient, PeerService};

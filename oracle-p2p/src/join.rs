//! Flood join: ask the seed for its members, then ask every member the seed
//! reported (one extra hop) so that each of them learns about us too.

use futures::future::join_all;
use tracing::{info, warn};

use oracle_common::{message::MemberList, OracleError, PeerAddress};

use crate::{membership::MembershipRegistry, ports::PeerClient};

/// Joins the network through `seed`.
///
/// The seed must answer with a well-formed member list, anything else is a
/// `StartupFatal` error. Peers that fail during the second hop are skipped;
/// the union of every list that did arrive is returned, `local` included.
pub async fn flood_join(
    client: &dyn PeerClient,
    local: &PeerAddress,
    seed: &PeerAddress,
) -> Result<MemberList, OracleError> {
    info!("🔗 Syncing to seed {}", seed);

    let seed_members = client
        .request_members(seed, local)
        .await
        .map_err(|e| OracleError::StartupFatal(OracleError::from(e).to_string()))?;

    let mut registry = MembershipRegistry::new(local.clone());
    registry.register(seed.clone());
    registry.merge(seed_members.iter().cloned());

    let second_hop: Vec<PeerAddress> = registry
        .peers()
        .into_iter()
        .filter(|peer| peer != seed)
        .collect();

    let replies = join_all(
        second_hop.iter().map(|peer| client.request_members(peer, local)),
    )
    .await;

    for (peer, reply) in second_hop.iter().zip(replies) {
        match reply {
            Ok(members) => {
                let added = registry.merge(members);
                tracing::info!(target: "consensus", "EVENT:JOIN_HOP peer={} new_members={}", peer, added);
            }
            Err(e) => warn!("⚠️ Sync with {} failed during join, skipping: {}", peer, e),
        }
    }

    info!("✅ Synced to {} nodes", registry.len() - 1);
    tracing::info!(target: "consensus", "EVENT:JOIN seed={} members={}", seed, registry.len());

    Ok(registry.snapshot())
}

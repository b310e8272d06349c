use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use oracle_common::OracleError;
use oracle_consensus::{price::SyntheticPriceSource, PriceSource};
use oracle_p2p::{HttpPeerClient, PeerClient};

use crate::{config::NodeConfig, node::OracleNode, runtime::trigger::TriggerLoop};

pub type Result<T> = std::result::Result<T, OracleError>;

/// A bootstrapped node plus its trigger loop.
pub struct OracleRuntime {
    pub node: Arc<OracleNode>,
    shutdown_tx: watch::Sender<bool>,
    trigger: JoinHandle<()>,
}

impl OracleRuntime {
    /// Stops the trigger loop and waits for the tick in progress to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.trigger.await {
            tracing::warn!("Trigger loop ended abnormally: {}", e);
        }
    }
}

/// Validates `config`, builds the node and joins the network through the
/// seed. A failed join is returned as `StartupFatal`.
pub async fn build_node(
    config: NodeConfig,
    client: Arc<dyn PeerClient>,
    price: Arc<dyn PriceSource>,
) -> Result<Arc<OracleNode>> {
    config.validate()?;

    let node = Arc::new(OracleNode::new(config, client, price));
    let members = node.bootstrap().await?;
    info!("✅ Node {} ready with {} known members", node.local, members);

    Ok(node)
}

/// Production wiring: HTTP peer client, synthetic price source, trigger
/// loop already running.
pub async fn build_runtime(config: NodeConfig) -> Result<OracleRuntime> {
    let client = Arc::new(HttpPeerClient::new(config.peer_timeout()));
    let price = Arc::new(SyntheticPriceSource::default());
    let interval = config.trigger_interval();

    let node = build_node(config, client, price).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let trigger = TriggerLoop::new(Arc::clone(&node), interval, shutdown_rx).spawn();

    Ok(OracleRuntime { node, shutdown_tx, trigger })
}

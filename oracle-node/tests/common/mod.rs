#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use oracle_common::PeerAddress;
use oracle_consensus::price::FixedPriceSource;
use oracle_node::{runtime::builder::build_node, NodeConfig, OracleNode};
use oracle_p2p::in_memory::InMemoryNetwork;

pub const PEER_TIMEOUT: Duration = Duration::from_millis(200);

pub struct TestNode {
    pub node: Arc<OracleNode>,
    pub price: Arc<FixedPriceSource>,
}

impl TestNode {
    pub fn addr(&self) -> PeerAddress {
        self.node.local.clone()
    }
}

pub fn addr(name: &str) -> PeerAddress {
    PeerAddress::new(format!("http://{}:80", name))
}

pub fn config(name: &str, seed: Option<&str>) -> NodeConfig {
    NodeConfig {
        base_url: format!("http://{}", name),
        port: ":80".into(),
        link: seed.map(|s| addr(s).to_string()),
        peer_timeout_ms: PEER_TIMEOUT.as_millis() as u64,
        ..Default::default()
    }
}

pub fn network() -> InMemoryNetwork {
    InMemoryNetwork::new(PEER_TIMEOUT)
}

pub async fn spawn_with_config(net: &InMemoryNetwork, config: NodeConfig, price: f64) -> TestNode {
    let price = Arc::new(FixedPriceSource::new(price));
    let node = build_node(config, Arc::new(net.clone()), price.clone())
        .await
        .expect("node should bootstrap");
    net.register(node.local.clone(), node.clone()).await;
    TestNode { node, price }
}

pub async fn spawn_node(net: &InMemoryNetwork, name: &str, seed: Option<&str>, price: f64) -> TestNode {
    spawn_with_config(net, config(name, seed), price).await
}

/// Nodes named `n0..n{count}`, each joining through `n0`.
pub async fn spawn_cluster(net: &InMemoryNetwork, prices: &[f64]) -> Vec<TestNode> {
    let mut nodes = Vec::with_capacity(prices.len());
    for (i, price) in prices.iter().enumerate() {
        let name = format!("n{}", i);
        let seed = if i == 0 { None } else { Some("n0") };
        nodes.push(spawn_node(net, &name, seed, *price).await);
    }
    nodes
}

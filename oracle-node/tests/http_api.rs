use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use oracle_common::PeerAddress;
use oracle_consensus::price::FixedPriceSource;
use oracle_node::{
    api::rest::{start_rest_api, AppState},
    node::TickOutcome,
    runtime::builder::build_node,
    NodeConfig, OracleNode,
};
use oracle_p2p::HttpPeerClient;

async fn start_http_node(seed: Option<&PeerAddress>, price: f64) -> Arc<OracleNode> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let config = NodeConfig {
        base_url: "http://127.0.0.1".into(),
        port: format!(":{}", port),
        link: seed.map(|s| s.to_string()),
        peer_timeout_ms: 1_000,
        ..Default::default()
    };
    let client = Arc::new(HttpPeerClient::new(config.peer_timeout()));
    let node = build_node(config, client, Arc::new(FixedPriceSource::new(price))).await.unwrap();

    let state = AppState { node: node.clone() };
    tokio::spawn(start_rest_api(listener, state, std::future::pending()));
    node
}

fn url(node: &OracleNode, path: &str) -> String {
    node.local.endpoint(path)
}

#[tokio::test]
async fn test_join_and_round_over_http() {
    let a = start_http_node(None, 1000.0).await;
    let b = start_http_node(Some(&a.local), 1002.0).await;
    let c = start_http_node(Some(&b.local), 998.0).await;

    for node in [&a, &b, &c] {
        assert_eq!(node.members().await.len(), 3);
    }

    match a.tick().await {
        TickOutcome::Completed(result) => {
            assert_eq!(result.median, 998.0);
            assert!(result.published);
        }
        other => panic!("expected a completed round, got {:?}", other),
    }

    // the push opened a round on both peers
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(b.coordinator.is_collecting().await);
    assert!(c.coordinator.is_collecting().await);
}

#[tokio::test]
async fn test_peer_endpoints_validate_requests() {
    let a = start_http_node(None, 42.0).await;
    let member = PeerAddress::from("http://127.0.0.1:1");
    a.membership.write().await.register(member.clone());
    let http = reqwest::Client::new();

    let bad_sync = http
        .post(url(&a, "/sync"))
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(bad_sync.status(), 400);

    let no_node = http.get(url(&a, "/answer")).send().await.unwrap();
    assert_eq!(no_node.status(), 400);

    let stranger = http
        .get(url(&a, "/answer"))
        .query(&[("node", "http://127.0.0.1:2")])
        .send()
        .await
        .unwrap();
    assert_eq!(stranger.status(), 400);
    assert!(stranger.text().await.unwrap().contains("Invalid node"));

    let wrong_method = http.post(url(&a, "/answer")).send().await.unwrap();
    assert_eq!(wrong_method.status(), 405);

    let answer = http
        .get(url(&a, "/answer"))
        .query(&[("node", member.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(answer.status(), 200);
    assert_eq!(answer.json::<f64>().await.unwrap(), 42.0);
}

#[tokio::test]
async fn test_sync_and_status_bodies() {
    let a = start_http_node(None, 5.0).await;
    let http = reqwest::Client::new();

    let members: Vec<String> = http
        .post(url(&a, "/sync"))
        .json(&serde_json::json!({ "node": "http://127.0.0.1:9" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(members.len(), 2);
    assert!(members.contains(&"http://127.0.0.1:9".to_string()));

    let push: serde_json::Value = http
        .post(url(&a, "/median"))
        .json(&serde_json::json!({ "node": "http://127.0.0.1:9", "value": 5.5 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(push["type"], "ack");

    let status: serde_json::Value = http.get(url(&a, "/status")).send().await.unwrap().json().await.unwrap();
    assert_eq!(status["node"], a.local.as_str());
    assert_eq!(status["members"].as_array().unwrap().len(), 2);
    assert_eq!(status["round"]["collecting"], false);
}

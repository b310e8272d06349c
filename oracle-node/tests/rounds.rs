mod common;

use std::time::Duration;

use common::{addr, config, network, spawn_cluster, spawn_node, spawn_with_config, PEER_TIMEOUT};
use oracle_common::{
    message::{MedianPush, PushReply},
    OracleError,
};
use oracle_node::node::TickOutcome;
use oracle_node::runtime::trigger::TriggerLoop;
use oracle_p2p::{NetworkError, PeerClient, PeerService};
use tokio::sync::watch;

fn completed(outcome: TickOutcome) -> oracle_consensus::round::RoundResult {
    match outcome {
        TickOutcome::Completed(result) => result,
        other => panic!("expected a completed round, got {:?}", other),
    }
}

#[tokio::test]
async fn test_leader_publishes_lower_median_of_peer_answers() {
    let net = network();
    let nodes = spawn_cluster(&net, &[1000.0, 1001.0, 999.0]).await;

    let result = completed(nodes[0].node.tick().await);

    assert_eq!(result.answers.len(), 2);
    assert_eq!(result.median, 999.0);
    assert!(result.published);
    assert_eq!(nodes[0].node.coordinator.last_published().await.map(|p| p.value), Some(999.0));
    assert!(!nodes[0].node.coordinator.is_collecting().await);
}

#[tokio::test]
async fn test_published_median_opens_rounds_on_peers() {
    let net = network();
    let nodes = spawn_cluster(&net, &[10.0, 20.0, 30.0]).await;

    completed(nodes[0].node.tick().await);

    for peer in &nodes[1..] {
        let snapshot = peer.node.coordinator.snapshot().await;
        assert!(snapshot.collecting);
        assert_eq!(snapshot.answers, 1);
        assert_eq!(peer.node.tick().await, TickOutcome::Busy);
    }
}

#[tokio::test]
async fn test_two_members_never_start_a_round() {
    let net = network();
    let a = spawn_node(&net, "a", None, 1.0).await;
    spawn_node(&net, "b", Some("a"), 1.0).await;

    assert_eq!(
        a.node.tick().await,
        TickOutcome::InsufficientMembership { members: 2, required: 3 }
    );
    assert!(!a.node.coordinator.is_collecting().await);
}

#[tokio::test]
async fn test_round_completes_with_two_of_five_unreachable() {
    let net = network();
    let nodes = spawn_cluster(&net, &[100.0, 101.0, 102.0, 103.0, 104.0]).await;
    net.set_unreachable(&nodes[3].addr(), true).await;
    net.set_unreachable(&nodes[4].addr(), true).await;

    let result = completed(nodes[0].node.tick().await);

    assert_eq!(result.answers.len(), 2);
    assert_eq!(result.median, 101.0);
}

#[tokio::test]
async fn test_hanging_peers_are_excluded_after_timeout() {
    let net = network();
    let nodes = spawn_cluster(&net, &[100.0, 101.0, 102.0, 103.0, 104.0]).await;
    net.set_delay(&nodes[3].addr(), Duration::from_secs(30)).await;
    net.set_delay(&nodes[4].addr(), Duration::from_secs(30)).await;

    let started = tokio::time::Instant::now();
    let result = completed(nodes[0].node.tick().await);

    assert_eq!(result.median, 101.0);
    assert!(started.elapsed() < PEER_TIMEOUT * 10);
}

#[tokio::test]
async fn test_inbound_calls_stay_responsive_during_fan_out() {
    let net = network();
    let nodes = spawn_cluster(&net, &[1.0, 2.0, 3.0, 4.0]).await;
    for peer in &nodes[1..] {
        net.set_delay(&peer.addr(), PEER_TIMEOUT - Duration::from_millis(50)).await;
    }

    let leader = nodes[0].node.clone();
    let round = tokio::spawn(async move { leader.tick().await });

    tokio::time::sleep(Duration::from_millis(30)).await;
    let quick = Duration::from_millis(50);

    let status = tokio::time::timeout(quick, nodes[0].node.status())
        .await
        .expect("status blocked by fan-out");
    assert!(status.round.collecting);
    let in_flight = status.round.round.unwrap();

    let reply = tokio::time::timeout(
        quick,
        nodes[0].node.on_push_median(MedianPush { node: addr("n1"), value: 9.0 }),
    )
    .await
    .expect("push blocked by fan-out")
    .unwrap();
    assert_eq!(reply, PushReply::Ack);

    let result = completed(round.await.unwrap());
    assert_eq!(result.round, in_flight);
    assert_eq!(result.answers.len(), 2);
    assert_eq!(result.answers[0], 9.0);
    assert!((2.0..=4.0).contains(&result.median));

    // the remaining pulled answers arrived after quorum and were not recorded
    let snapshot = nodes[0].node.coordinator.snapshot().await;
    assert!(!snapshot.collecting);
    assert_eq!(snapshot.answers, 0);
    assert_eq!(
        nodes[0].node.coordinator.record_answer(in_flight, 5.0).await,
        oracle_consensus::round::RecordOutcome::Stale
    );
}

#[tokio::test]
async fn test_fan_out_below_quorum_abandons_round() {
    let net = network();
    let nodes = spawn_cluster(&net, &[1.0, 2.0, 3.0, 4.0]).await;
    net.set_unreachable(&nodes[2].addr(), true).await;
    net.set_unreachable(&nodes[3].addr(), true).await;

    match nodes[0].node.tick().await {
        TickOutcome::Abandoned { answers, .. } => assert_eq!(answers, 1),
        other => panic!("expected abandoned round, got {:?}", other),
    }
    assert!(!nodes[0].node.coordinator.is_collecting().await);
    assert_eq!(nodes[0].node.coordinator.last_published().await, None);
}

#[tokio::test]
async fn test_bounded_fan_out_still_reaches_quorum() {
    let net = network();
    let mut cfg = config("n0", None);
    cfg.max_in_flight = Some(1);
    let leader = spawn_with_config(&net, cfg, 5.0).await;
    spawn_node(&net, "n1", Some("n0"), 6.0).await;
    spawn_node(&net, "n2", Some("n0"), 7.0).await;

    let result = completed(leader.node.tick().await);
    assert_eq!(result.median, 6.0);
}

#[tokio::test]
async fn test_change_gate_suppresses_small_moves() {
    let net = network();
    let nodes = spawn_cluster(&net, &[100.0, 100.0, 100.0]).await;
    let leader = &nodes[0];

    assert!(completed(leader.node.tick().await).published);

    leader.price.set(100.5);
    assert_eq!(leader.node.tick().await, TickOutcome::Unchanged { estimate: 100.5 });

    leader.price.set(102.0);
    nodes[1].price.set(102.0);
    nodes[2].price.set(102.0);
    let result = completed(leader.node.tick().await);
    assert!(result.published);
    assert_eq!(result.previous, Some(100.0));
    assert_eq!(leader.node.coordinator.last_published().await.map(|p| p.value), Some(102.0));
}

#[tokio::test]
async fn test_agreed_median_within_threshold_is_not_published() {
    let net = network();
    let nodes = spawn_cluster(&net, &[100.0, 100.0, 100.0]).await;
    let leader = &nodes[0];
    completed(leader.node.tick().await);

    leader.price.set(105.0);
    nodes[1].price.set(100.3);
    nodes[2].price.set(100.4);

    let result = completed(leader.node.tick().await);
    assert!(!result.published);
    assert_eq!(result.median, 100.3);
    assert_eq!(leader.node.coordinator.last_published().await.map(|p| p.value), Some(100.0));
}

#[tokio::test]
async fn test_pull_from_unknown_caller_is_rejected() {
    let net = network();
    let a = spawn_node(&net, "a", None, 1.0).await;

    let direct = a.node.on_pull_answer(Some(addr("stranger"))).await;
    assert!(matches!(direct, Err(OracleError::MalformedRequest(msg)) if msg == "Invalid node"));

    let missing = a.node.on_pull_answer(None).await;
    assert!(matches!(missing, Err(OracleError::MalformedRequest(_))));

    match net.pull_answer(&a.addr(), &addr("stranger")).await {
        Err(NetworkError::Status { status, .. }) => assert_eq!(status, 400),
        other => panic!("expected a 400, got {:?}", other),
    }
}

#[tokio::test]
async fn test_push_opens_then_joins_a_round() {
    let net = network();
    let nodes = spawn_cluster(&net, &[0.0, 12.0, 0.0]).await;
    let follower = &nodes[1];

    let first = follower.node.on_push_median(MedianPush { node: addr("n0"), value: 10.0 }).await.unwrap();
    assert_eq!(first, PushReply::Answer { value: 12.0 });

    let second = follower.node.on_push_median(MedianPush { node: addr("n2"), value: 14.0 }).await.unwrap();
    assert_eq!(second, PushReply::Ack);

    assert!(!follower.node.coordinator.is_collecting().await);
    assert_eq!(follower.node.coordinator.last_published().await.map(|p| p.value), Some(10.0));
}

#[tokio::test]
async fn test_push_is_acknowledged_but_ignored_below_minimum_membership() {
    let net = network();
    let a = spawn_node(&net, "a", None, 1.0).await;

    let reply = a.node.on_push_median(MedianPush { node: addr("b"), value: 3.0 }).await.unwrap();
    assert_eq!(reply, PushReply::Ack);
    assert!(!a.node.coordinator.is_collecting().await);
}

#[tokio::test]
async fn test_non_finite_push_is_rejected() {
    let net = network();
    let nodes = spawn_cluster(&net, &[1.0, 1.0, 1.0]).await;

    let result = nodes[0].node.on_push_median(MedianPush { node: addr("n1"), value: f64::NAN }).await;
    assert!(matches!(result, Err(OracleError::MalformedRequest(_))));
    assert!(!nodes[0].node.coordinator.is_collecting().await);
}

#[tokio::test]
async fn test_stuck_remote_round_expires() {
    let net = network();
    let mut cfg = config("n0", None);
    cfg.round_timeout_ms = Some(100);
    let a = spawn_with_config(&net, cfg, 50.0).await;
    spawn_node(&net, "n1", Some("n0"), 50.0).await;
    spawn_node(&net, "n2", Some("n0"), 50.0).await;

    a.node.on_push_median(MedianPush { node: addr("n1"), value: 1.0 }).await.unwrap();
    assert_eq!(a.node.tick().await, TickOutcome::Busy);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(completed(a.node.tick().await).published);
}

#[tokio::test]
async fn test_trigger_loop_runs_first_round_immediately() {
    let net = network();
    let nodes = spawn_cluster(&net, &[7.0, 7.0, 7.0]).await;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = TriggerLoop::new(nodes[0].node.clone(), Duration::from_secs(60), shutdown_rx).spawn();

    let mut published = None;
    for _ in 0..50 {
        published = nodes[0].node.coordinator.last_published().await;
        if published.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(published.map(|p| p.value), Some(7.0));

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
}

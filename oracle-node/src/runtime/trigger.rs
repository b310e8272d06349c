use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::node::{OracleNode, TickOutcome};

/// Fires [`OracleNode::tick`] every `interval`, starting immediately.
///
/// A tick that finds a round still collecting does nothing; ticks missed
/// while a round runs long are dropped, not queued.
pub struct TriggerLoop {
    node: Arc<OracleNode>,
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl TriggerLoop {
    pub fn new(node: Arc<OracleNode>, interval: Duration, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self { node, interval, shutdown_rx }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        info!("⏱️ Trigger loop started, every {:?}", self.interval);

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.node.tick().await {
                        TickOutcome::Completed(result) => {
                            debug!("Tick closed round {} with median {}", result.round, result.median)
                        }
                        other => debug!("Tick: {:?}", other),
                    }
                }
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("Trigger loop shutting down");
                        break;
                    }
                }
            }
        }
    }
}

//! In-process network: routes [`PeerClient`] calls straight to registered
//! [`PeerService`] handlers. Peers can be switched off or slowed down to
//! exercise timeouts and exclusion without sockets.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use oracle_common::{
    message::{MedianPush, MemberList, PushReply},
    OracleError, PeerAddress,
};

use crate::{
    error::NetworkError,
    ports::{PeerClient, PeerService},
};

#[derive(Clone)]
pub struct InMemoryNetwork {
    services: Arc<RwLock<HashMap<PeerAddress, Arc<dyn PeerService>>>>,
    unreachable: Arc<RwLock<HashSet<PeerAddress>>>,
    delays: Arc<RwLock<HashMap<PeerAddress, Duration>>>,
    timeout: Duration,
}

impl InMemoryNetwork {
    pub fn new(timeout: Duration) -> Self {
        Self {
            services: Arc::new(RwLock::new(HashMap::new())),
            unreachable: Arc::new(RwLock::new(HashSet::new())),
            delays: Arc::new(RwLock::new(HashMap::new())),
            timeout,
        }
    }

    pub async fn register(&self, addr: PeerAddress, service: Arc<dyn PeerService>) {
        self.services.write().await.insert(addr, service);
    }

    /// Makes every call to `addr` fail as if the host refused the connection.
    pub async fn set_unreachable(&self, addr: &PeerAddress, unreachable: bool) {
        let mut set = self.unreachable.write().await;
        if unreachable {
            set.insert(addr.clone());
        } else {
            set.remove(addr);
        }
    }

    /// Delays every answer from `addr`; a delay past the timeout hangs the call.
    pub async fn set_delay(&self, addr: &PeerAddress, delay: Duration) {
        self.delays.write().await.insert(addr.clone(), delay);
    }

    async fn route(&self, peer: &PeerAddress) -> Result<Arc<dyn PeerService>, NetworkError> {
        if self.unreachable.read().await.contains(peer) {
            return Err(NetworkError::Unreachable {
                peer: peer.clone(),
                reason: "connection refused".into(),
            });
        }

        self.services
            .read()
            .await
            .get(peer)
            .cloned()
            .ok_or_else(|| NetworkError::Unreachable {
                peer: peer.clone(),
                reason: "no such host".into(),
            })
    }

    async fn deliver<T, F>(&self, peer: &PeerAddress, call: F) -> Result<T, NetworkError>
    where
        F: Future<Output = Result<T, OracleError>>,
    {
        let delay = self.delays.read().await.get(peer).copied().unwrap_or_default();

        let outcome = tokio::time::timeout(self.timeout, async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            call.await
        })
        .await
        .map_err(|_| NetworkError::Timeout { peer: peer.clone(), timeout: self.timeout })?;

        outcome.map_err(|e| NetworkError::Status {
            peer: peer.clone(),
            status: if e.is_client_error() { 400 } else { 500 },
            body: e.to_string(),
        })
    }
}

#[async_trait]
impl PeerClient for InMemoryNetwork {
    async fn request_members(&self, peer: &PeerAddress, caller: &PeerAddress) -> Result<MemberList, NetworkError> {
        let service = self.route(peer).await?;
        self.deliver(peer, service.on_sync(caller.clone())).await
    }

    async fn pull_answer(&self, peer: &PeerAddress, caller: &PeerAddress) -> Result<f64, NetworkError> {
        let service = self.route(peer).await?;
        self.deliver(peer, service.on_pull_answer(Some(caller.clone()))).await
    }

    async fn push_median(&self, peer: &PeerAddress, caller: &PeerAddress, value: f64) -> Result<PushReply, NetworkError> {
        let service = self.route(peer).await?;
        let push = MedianPush { node: caller.clone(), value };
        self.deliver(peer, service.on_push_median(push)).await
    }
}

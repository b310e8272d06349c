use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use oracle_common::{
    message::{MedianPush, MemberList, PushReply, SyncRequest},
    PeerAddress,
};

use crate::{error::NetworkError, ports::PeerClient};

/// JSON-over-HTTP implementation of [`PeerClient`].
///
/// Each request carries its own timeout covering connect, send and the full
/// response body.
#[derive(Clone, Debug)]
pub struct HttpPeerClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpPeerClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
        }
    }

    fn classify(&self, peer: &PeerAddress, err: reqwest::Error) -> NetworkError {
        if err.is_timeout() {
            NetworkError::Timeout { peer: peer.clone(), timeout: self.timeout }
        } else if err.is_decode() {
            NetworkError::Malformed { peer: peer.clone(), reason: err.to_string() }
        } else {
            NetworkError::Unreachable { peer: peer.clone(), reason: err.to_string() }
        }
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        peer: &PeerAddress,
        resp: reqwest::Response,
    ) -> Result<T, NetworkError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NetworkError::Status {
                peer: peer.clone(),
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<T>().await.map_err(|e| self.classify(peer, e))
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn request_members(&self, peer: &PeerAddress, caller: &PeerAddress) -> Result<MemberList, NetworkError> {
        debug!("POST {}", peer.endpoint("/sync"));
        let resp = self.http
            .post(peer.endpoint("/sync"))
            .timeout(self.timeout)
            .json(&SyncRequest { node: caller.clone() })
            .send()
            .await
            .map_err(|e| self.classify(peer, e))?;

        self.decode(peer, resp).await
    }

    async fn pull_answer(&self, peer: &PeerAddress, caller: &PeerAddress) -> Result<f64, NetworkError> {
        debug!("GET {}", peer.endpoint("/answer"));
        let resp = self.http
            .get(peer.endpoint("/answer"))
            .timeout(self.timeout)
            .query(&[("node", caller.as_str())])
            .send()
            .await
            .map_err(|e| self.classify(peer, e))?;

        let value: f64 = self.decode(peer, resp).await?;
        if !value.is_finite() {
            return Err(NetworkError::Malformed {
                peer: peer.clone(),
                reason: format!("non-finite answer {}", value),
            });
        }
        Ok(value)
    }

    async fn push_median(&self, peer: &PeerAddress, caller: &PeerAddress, value: f64) -> Result<PushReply, NetworkError> {
        debug!("POST {}", peer.endpoint("/median"));
        let resp = self.http
            .post(peer.endpoint("/median"))
            .timeout(self.timeout)
            .json(&MedianPush { node: caller.clone(), value })
            .send()
            .await
            .map_err(|e| self.classify(peer, e))?;

        self.decode(peer, resp).await
    }
}

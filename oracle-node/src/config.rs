use std::{fs, net::SocketAddr, path::{Path, PathBuf}, time::Duration};

use serde::{Deserialize, Serialize};

use oracle_common::{OracleError, PeerAddress};

/// Runtime settings of one oracle node.
///
/// The node's own address is `base_url` followed by `port`, e.g.
/// `http://localhost` + `:3000`. That string is what peers store in their
/// member lists, so it must be reachable from every other node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub base_url: String,
    pub port: String,
    /// Seed node to join through. `None` starts a new network.
    pub link: Option<String>,
    pub diff_threshold: f64,
    /// Seconds between trigger ticks.
    pub time_interval: u64,
    pub peer_timeout_ms: u64,
    /// Deadline for rounds opened by a pushed median. Local rounds end with
    /// their own fan-out. `None` keeps pushed rounds open until quorum.
    pub round_timeout_ms: Option<u64>,
    pub max_in_flight: Option<usize>,
    pub log_dir: Option<PathBuf>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            port: ":3000".to_string(),
            link: None,
            diff_threshold: 0.01,
            time_interval: 10,
            peer_timeout_ms: 2_000,
            round_timeout_ms: Some(5_000),
            max_in_flight: None,
            log_dir: None,
        }
    }
}

impl NodeConfig {
    pub fn self_address(&self) -> PeerAddress {
        PeerAddress::new(format!("{}{}", self.base_url, self.port))
    }

    pub fn seed(&self) -> Option<PeerAddress> {
        self.link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
            .map(PeerAddress::from)
    }

    /// Numeric port, accepting both `:3000` and `3000`.
    pub fn port_number(&self) -> Result<u16, OracleError> {
        self.port
            .trim_start_matches(':')
            .parse::<u16>()
            .map_err(|e| OracleError::Config(format!("port {:?}: {}", self.port, e)))
    }

    /// The HTTP server listens on every interface.
    pub fn listen_addr(&self) -> Result<SocketAddr, OracleError> {
        Ok(SocketAddr::from(([0, 0, 0, 0], self.port_number()?)))
    }

    pub fn trigger_interval(&self) -> Duration {
        Duration::from_secs(self.time_interval)
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }

    pub fn round_timeout(&self) -> Option<Duration> {
        self.round_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), OracleError> {
        if self.base_url.trim().is_empty() {
            return Err(OracleError::Config("base_url must not be empty".into()));
        }
        self.port_number()?;

        if !self.diff_threshold.is_finite() || self.diff_threshold < 0.0 {
            return Err(OracleError::Config(format!(
                "diff_threshold must be a non-negative number, got {}",
                self.diff_threshold
            )));
        }
        if self.time_interval == 0 {
            return Err(OracleError::Config("time_interval must be at least 1 second".into()));
        }
        if self.peer_timeout_ms == 0 {
            return Err(OracleError::Config("peer_timeout_ms must be positive".into()));
        }
        if self.round_timeout_ms == Some(0) {
            return Err(OracleError::Config("round_timeout_ms must be positive when set".into()));
        }
        if self.max_in_flight == Some(0) {
            return Err(OracleError::Config("max_in_flight must be positive when set".into()));
        }
        if self.seed().as_ref() == Some(&self.self_address()) {
            return Err(OracleError::Config("link points at this node itself".into()));
        }
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, OracleError> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), OracleError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

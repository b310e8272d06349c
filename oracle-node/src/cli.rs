use std::path::PathBuf;

use clap::Parser;

use oracle_common::OracleError;

use crate::config::NodeConfig;

#[derive(Parser, Debug)]
#[command(name = "oracle-node", about = "Price oracle node: agrees on a median value with its peers", version)]
pub struct Args {
    /// Address of an existing node to join through
    #[arg(long)]
    pub link: Option<String>,

    /// Base url peers use to reach this node
    #[arg(long = "base-url", default_value = "http://localhost")]
    pub base_url: String,

    /// Port suffix appended to the base url, e.g. ":3000"
    #[arg(long, default_value = ":3000")]
    pub port: String,

    /// Minimum relative change of the median before it is published
    #[arg(long = "diff-threshold", default_value_t = 0.01)]
    pub diff_threshold: f64,

    /// Seconds between rounds
    #[arg(long = "time-interval", default_value_t = 10)]
    pub time_interval: u64,

    /// Per-call timeout for peer requests, in milliseconds
    #[arg(long = "peer-timeout-ms", default_value_t = 2000)]
    pub peer_timeout_ms: u64,

    /// Reset a push-opened round that has not reached quorum after this many ms (0 disables)
    #[arg(long = "round-timeout-ms", default_value_t = 5000)]
    pub round_timeout_ms: u64,

    /// Upper bound on concurrent outbound answer requests
    #[arg(long = "max-in-flight")]
    pub max_in_flight: Option<usize>,

    /// JSON config file; replaces every flag except --link and --log-dir
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for the round event log
    #[arg(long = "log-dir")]
    pub log_dir: Option<PathBuf>,
}

impl Args {
    pub fn into_config(self) -> Result<NodeConfig, OracleError> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::load_from_file(path)?,
            None => NodeConfig {
                base_url: self.base_url,
                port: self.port,
                link: None,
                diff_threshold: self.diff_threshold,
                time_interval: self.time_interval,
                peer_timeout_ms: self.peer_timeout_ms,
                round_timeout_ms: Some(self.round_timeout_ms).filter(|ms| *ms > 0),
                max_in_flight: self.max_in_flight,
                log_dir: self.log_dir.clone(),
            },
        };

        if self.link.is_some() {
            config.link = self.link;
        }
        if self.log_dir.is_some() {
            config.log_dir = self.log_dir;
        }

        config.validate()?;
        Ok(config)
    }
}

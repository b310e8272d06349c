use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use oracle_node::{
    api::rest::{start_rest_api, AppState},
    build_runtime,
    cli::Args,
    logging::{init_tracing, install_panic_hook},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Arguments and config
    let config = Args::parse().into_config()?;
    let node_name = config.port.trim_start_matches(':').to_string();

    // 2. Logging
    install_panic_hook();
    let _log_guard = init_tracing(&node_name, config.log_dir.as_deref());

    info!("--- STARTING ORACLE NODE ---");
    info!("Address: {}", config.self_address());
    info!("Seed: {}", config.link.as_deref().unwrap_or("none"));
    info!("Threshold: {} | Interval: {}s", config.diff_threshold, config.time_interval);

    // 3. Bind before joining so peers that sync back can connect
    let listener = TcpListener::bind(config.listen_addr()?).await?;

    // 4. Join the network and start the trigger loop
    let runtime = match build_runtime(config).await {
        Ok(rt) => rt,
        Err(e) => {
            error!("❌ Failed to start node: {}", e);
            return Err(e.into());
        }
    };

    // 5. Serve the peer API until Ctrl+C
    let state = AppState { node: runtime.node.clone() };
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        info!("🛑 Shutdown requested");
    };

    let served = start_rest_api(listener, state, shutdown).await;
    runtime.shutdown().await;

    served?;
    info!("Node stopped");
    Ok(())
}

//! RepoGate - Main Entry Point
//! GitHub repository gateway with named-queue admission control

mod config;
mod telemetry;

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

// Import workspace crates
use config::GatewayConfig;
use repogate_api_rpc::{default_bindings, RpcServer};
use repogate_core::application::{DispatchBridge, QueueRegistry, RepositoryService};
use repogate_core::port::id_provider::UuidProvider;
use repogate_core::port::time_provider::SystemTimeProvider;
use repogate_infra_github::GitHubClient;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration (fails fast on malformed values)
    let config = GatewayConfig::from_env()?;

    // 2. Initialize logging
    let _log_guard = telemetry::init(&config)?;

    info!("RepoGate v{} starting...", VERSION);
    if config.github.token.is_none() {
        warn!("GITHUB_TOKEN not set, GitHub requests are unauthenticated and heavily rate limited");
    }

    // 3. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);

    let github = GitHubClient::new(config.github.clone())
        .map_err(|e| anyhow::anyhow!("GitHub client creation failed: {}", e))?;
    info!(api_url = %config.github.api_url, "GitHub provider ready");

    let registry = Arc::new(QueueRegistry::new(time_provider));
    let bindings = Arc::new(default_bindings(
        config.repository_concurrency,
        config.repository_timeout,
    ));
    for (operation, binding) in bindings.iter() {
        info!(
            operation,
            queue = %binding.queue,
            concurrency = ?binding.concurrency,
            timeout_ms = ?binding.timeout.map(|t| t.as_millis() as u64),
            "Operation bound to queue"
        );
    }
    let bridge = Arc::new(DispatchBridge::new(registry, bindings, id_provider)?);
    let repositories = RepositoryService::new(Arc::new(github));

    // 4. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_server = RpcServer::new(config.rpc.clone(), repositories, bridge);
    let (rpc_handle, addr) = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(addr = %addr, "System ready");
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;
    telemetry::shutdown();

    info!("Shutdown complete.");

    Ok(())
}

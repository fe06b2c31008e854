//! JSON-RPC Server
//!
//! Serves the gateway's JSON-RPC 2.0 methods over HTTP.

use crate::handler::RpcHandler;
use crate::methods;
use crate::types::RepositoryRequest;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use repogate_core::application::{DispatchBridge, RepositoryService};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
pub const DEFAULT_RPC_PORT: u16 = 9640;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    /// `0` picks a free port
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        repositories: RepositoryService,
        bridge: Arc<DispatchBridge>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(repositories, bridge)),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the handle and the address actually bound.
    pub async fn start(self) -> Result<(ServerHandle, SocketAddr), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let mut module = RpcModule::new(());

        // Register methods
        let handler = self.handler.clone();
        module
            .register_async_method(methods::REPOSITORIES_LIST, move |_, _, _| {
                let handler = handler.clone();
                async move { handler.list_repositories().await }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method(methods::REPOSITORY_GET, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RepositoryRequest = params.parse()?;
                    handler.repository(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method(methods::REPOSITORY_FILES_COUNT, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RepositoryRequest = params.parse()?;
                    handler.files_count(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method(methods::REPOSITORY_YML_FILE, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RepositoryRequest = params.parse()?;
                    handler.yml_file(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method(methods::REPOSITORY_WEBHOOKS, move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RepositoryRequest = params.parse()?;
                    handler.webhooks(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Admin APIs
        let handler = self.handler.clone();
        module
            .register_async_method(methods::ADMIN_QUEUES, move |_, _, _| {
                let handler = handler.clone();
                async move { handler.queues().await }
            })
            .map_err(|e| e.to_string())?;

        info!(addr = %local_addr, "JSON-RPC server started");

        let handle = server.start(module);
        Ok((handle, local_addr))
    }
}

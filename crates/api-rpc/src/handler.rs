//! RPC Method Handlers
//!
//! Every repository method goes through the dispatch bridge under its own
//! method name, so binding a method to a queue is a table change only.

use crate::error::to_rpc_error;
use crate::methods;
use crate::types::{FilesCountResponse, QueueStatsResponse, RepositoryRequest};
use jsonrpsee::types::ErrorObjectOwned;
use repogate_core::application::{DispatchBridge, RepositoryService};
use repogate_core::domain::{Repository, RepositoryFile, RepositoryLean, RepositoryWebhook};
use std::sync::Arc;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    repositories: RepositoryService,
    bridge: Arc<DispatchBridge>,
    start_time: std::time::Instant,
}

impl RpcHandler {
    pub fn new(repositories: RepositoryService, bridge: Arc<DispatchBridge>) -> Self {
        Self {
            repositories,
            bridge,
            start_time: std::time::Instant::now(),
        }
    }

    /// repositories.list.v1
    pub async fn list_repositories(&self) -> Result<Vec<RepositoryLean>, ErrorObjectOwned> {
        let service = self.repositories.clone();
        self.bridge
            .dispatch(methods::REPOSITORIES_LIST, move || async move {
                service.list().await
            })
            .await
            .map_err(to_rpc_error)
    }

    /// repository.get.v1
    pub async fn repository(
        &self,
        params: RepositoryRequest,
    ) -> Result<Repository, ErrorObjectOwned> {
        let service = self.repositories.clone();
        let reference = params.reference();
        self.bridge
            .dispatch(methods::REPOSITORY_GET, move || async move {
                service.get(&reference).await
            })
            .await
            .map_err(to_rpc_error)
    }

    /// repository.files_count.v1
    pub async fn files_count(
        &self,
        params: RepositoryRequest,
    ) -> Result<FilesCountResponse, ErrorObjectOwned> {
        let service = self.repositories.clone();
        let reference = params.reference();
        let count = self
            .bridge
            .dispatch(methods::REPOSITORY_FILES_COUNT, move || async move {
                service.files_count(&reference, params.default_branch).await
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(FilesCountResponse { count })
    }

    /// repository.yml_file.v1
    pub async fn yml_file(
        &self,
        params: RepositoryRequest,
    ) -> Result<Option<RepositoryFile>, ErrorObjectOwned> {
        let service = self.repositories.clone();
        let reference = params.reference();
        self.bridge
            .dispatch(methods::REPOSITORY_YML_FILE, move || async move {
                service.yml_file(&reference, params.default_branch).await
            })
            .await
            .map_err(to_rpc_error)
    }

    /// repository.webhooks.v1
    pub async fn webhooks(
        &self,
        params: RepositoryRequest,
    ) -> Result<Vec<RepositoryWebhook>, ErrorObjectOwned> {
        let service = self.repositories.clone();
        let reference = params.reference();
        self.bridge
            .dispatch(methods::REPOSITORY_WEBHOOKS, move || async move {
                service.active_webhooks(&reference).await
            })
            .await
            .map_err(to_rpc_error)
    }

    /// admin.queues.v1
    pub async fn queues(&self) -> Result<QueueStatsResponse, ErrorObjectOwned> {
        Ok(QueueStatsResponse {
            queues: self.bridge.registry().snapshot(),
            uptime_seconds: self.start_time.elapsed().as_secs() as i64,
        })
    }
}

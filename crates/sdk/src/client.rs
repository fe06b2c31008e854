//! RepoGate Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    FilesCountResponse, QueueStatsResponse, Repository, RepositoryFile, RepositoryRequest,
    RepositorySummary, RepositoryWebhook,
};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// RepoGate Client
///
/// Provides a high-level interface to the gateway's JSON-RPC methods.
///
/// # Example
///
/// ```no_run
/// use repogate_sdk::RepoGateClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RepoGateClient::connect("http://127.0.0.1:9640").await?;
/// let repo = client.repository("octo", "alpha").await?;
/// println!("{} is {} KB", repo.name, repo.size);
/// # Ok(())
/// # }
/// ```
pub struct RepoGateClient {
    client: HttpClient,
}

impl RepoGateClient {
    /// Connect to the gateway
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9640`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        Self::connect_with_timeout(url, DEFAULT_REQUEST_TIMEOUT).await
    }

    pub async fn connect_with_timeout(url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(timeout)
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    /// All repositories of the gateway's GitHub account, most recently updated first
    pub async fn repositories(&self) -> Result<Vec<RepositorySummary>> {
        let response = self
            .client
            .request("repositories.list.v1", rpc_params![])
            .await?;
        Ok(response)
    }

    /// A single repository. Runs through the gateway's `repository` queue, so
    /// it may fail with a queue timeout (`SdkError::is_queue_timeout`).
    pub async fn repository(&self, owner: &str, repo: &str) -> Result<Repository> {
        self.repository_call("repository.get.v1", owner, repo).await
    }

    /// Number of files on the default branch
    pub async fn files_count(&self, owner: &str, repo: &str) -> Result<usize> {
        let response: FilesCountResponse = self
            .repository_call("repository.files_count.v1", owner, repo)
            .await?;
        Ok(response.count)
    }

    /// First `.yml` file of the repository, if any
    pub async fn yml_file(&self, owner: &str, repo: &str) -> Result<Option<RepositoryFile>> {
        self.repository_call("repository.yml_file.v1", owner, repo)
            .await
    }

    pub async fn active_webhooks(&self, owner: &str, repo: &str) -> Result<Vec<RepositoryWebhook>> {
        self.repository_call("repository.webhooks.v1", owner, repo)
            .await
    }

    /// Queue statistics
    pub async fn queue_stats(&self) -> Result<QueueStatsResponse> {
        let response = self.client.request("admin.queues.v1", rpc_params![]).await?;
        Ok(response)
    }

    async fn repository_call<R: DeserializeOwned>(
        &self,
        method: &str,
        owner: &str,
        repo: &str,
    ) -> Result<R> {
        let request = RepositoryRequest {
            owner: owner.to_string(),
            repo: repo.to_string(),
            default_branch: None,
        };
        let response = self.client.request(method, to_params(&request)?).await?;
        Ok(response)
    }
}

/// Named params from a serializable struct
fn to_params(request: &RepositoryRequest) -> Result<ObjectParams> {
    let mut params = ObjectParams::new();
    params.insert("owner", &request.owner)?;
    params.insert("repo", &request.repo)?;
    if let Some(branch) = &request.default_branch {
        params.insert("default_branch", branch)?;
    }
    Ok(params)
}

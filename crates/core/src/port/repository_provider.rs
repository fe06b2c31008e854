// Repository Provider Port
// Abstraction over the source-hosting provider (GitHub GraphQL + REST)

use async_trait::async_trait;
use thiserror::Error;

/// Repository as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRepository {
    pub database_id: i64,
    pub name: String,
    pub owner_login: String,
    pub disk_usage: i64,
    pub is_private: bool,
    /// `None` for empty repositories
    pub default_branch: Option<String>,
}

/// Git tree entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEntryKind {
    Blob,
    Tree,
    Commit,
}

/// Entry of a recursive git tree listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub kind: TreeEntryKind,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: TreeEntryKind::Blob,
        }
    }

    pub fn tree(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: TreeEntryKind::Tree,
        }
    }

    pub fn is_blob(&self) -> bool {
        self.kind == TreeEntryKind::Blob
    }
}

/// Repository webhook as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderWebhook {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub url: Option<String>,
}

/// Provider errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request quota exhausted (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("Secondary rate limit detected")]
    SecondaryRateLimited,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("file type mismatch: {0}")]
    FileTypeMismatch(String),
}

impl ProviderError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. } | ProviderError::SecondaryRateLimited
        )
    }
}

/// Repository Provider trait
///
/// Implementations:
/// - GitHubClient (repogate-infra-github): GraphQL v4 + REST v3
/// - MockRepositoryProvider: in-memory fixtures for tests
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    /// All repositories of the authenticated viewer, most recently updated first
    async fn list_repositories(&self) -> Result<Vec<ProviderRepository>, ProviderError>;

    /// A single repository
    ///
    /// # Errors
    /// - ProviderError::NotFound if the repository does not exist or is not visible
    async fn find_repository(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<ProviderRepository, ProviderError>;

    /// Recursive tree of `branch`, all entry kinds
    async fn list_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<TreeEntry>, ProviderError>;

    /// Decoded UTF-8 content of a file
    ///
    /// # Errors
    /// - ProviderError::FileTypeMismatch if `path` is a directory, symlink or submodule
    async fn file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String, ProviderError>;

    /// All webhooks of a repository (active and inactive)
    async fn list_webhooks(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<ProviderWebhook>, ProviderError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory provider with configurable latency and failure
    #[derive(Default)]
    pub struct MockRepositoryProvider {
        repositories: Vec<ProviderRepository>,
        trees: HashMap<String, Vec<TreeEntry>>,
        files: HashMap<String, String>,
        webhooks: HashMap<String, Vec<ProviderWebhook>>,
        latency: Duration,
        latency_by_repo: HashMap<String, Duration>,
        failure: Mutex<Option<ProviderError>>,
        call_count: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    fn key(owner: &str, repo: &str) -> String {
        format!("{}/{}", owner, repo)
    }

    impl MockRepositoryProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_repository(mut self, repository: ProviderRepository) -> Self {
            self.repositories.push(repository);
            self
        }

        pub fn with_tree(mut self, owner: &str, repo: &str, entries: Vec<TreeEntry>) -> Self {
            self.trees.insert(key(owner, repo), entries);
            self
        }

        pub fn with_file(mut self, owner: &str, repo: &str, path: &str, content: &str) -> Self {
            self.files
                .insert(format!("{}:{}", key(owner, repo), path), content.to_string());
            self
        }

        pub fn with_webhooks(
            mut self,
            owner: &str,
            repo: &str,
            hooks: Vec<ProviderWebhook>,
        ) -> Self {
            self.webhooks.insert(key(owner, repo), hooks);
            self
        }

        /// Latency applied to every call
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        /// Latency applied to `find_repository` for one repository name
        pub fn with_latency_for(mut self, repo: &str, latency: Duration) -> Self {
            self.latency_by_repo.insert(repo.to_string(), latency);
            self
        }

        /// Make every subsequent call fail with `error`
        pub fn fail_with(&self, error: ProviderError) {
            *self.failure.lock() = Some(error);
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Highest number of calls observed in flight at the same time
        pub fn peak_in_flight(&self) -> usize {
            self.peak_in_flight.load(Ordering::SeqCst)
        }

        async fn enter(&self, latency: Duration) -> Result<(), ProviderError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let failure = self.failure.lock().clone();
            match failure {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl RepositoryProvider for MockRepositoryProvider {
        async fn list_repositories(&self) -> Result<Vec<ProviderRepository>, ProviderError> {
            self.enter(self.latency).await?;
            Ok(self.repositories.clone())
        }

        async fn find_repository(
            &self,
            owner: &str,
            repo: &str,
        ) -> Result<ProviderRepository, ProviderError> {
            let latency = self
                .latency_by_repo
                .get(repo)
                .copied()
                .unwrap_or(self.latency);
            self.enter(latency).await?;

            self.repositories
                .iter()
                .find(|r| r.owner_login == owner && r.name == repo)
                .cloned()
                .ok_or_else(|| ProviderError::NotFound(key(owner, repo)))
        }

        async fn list_tree(
            &self,
            owner: &str,
            repo: &str,
            _branch: &str,
        ) -> Result<Vec<TreeEntry>, ProviderError> {
            self.enter(self.latency).await?;
            Ok(self.trees.get(&key(owner, repo)).cloned().unwrap_or_default())
        }

        async fn file_content(
            &self,
            owner: &str,
            repo: &str,
            path: &str,
        ) -> Result<String, ProviderError> {
            self.enter(self.latency).await?;
            self.files
                .get(&format!("{}:{}", key(owner, repo), path))
                .cloned()
                .ok_or_else(|| ProviderError::NotFound(path.to_string()))
        }

        async fn list_webhooks(
            &self,
            owner: &str,
            repo: &str,
        ) -> Result<Vec<ProviderWebhook>, ProviderError> {
            self.enter(self.latency).await?;
            Ok(self
                .webhooks
                .get(&key(owner, repo))
                .cloned()
                .unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::MockRepositoryProvider;
    use super::*;

    #[tokio::test]
    async fn test_mock_failure_applies_to_later_calls() {
        let provider = MockRepositoryProvider::new();
        assert!(provider.list_repositories().await.unwrap().is_empty());

        provider.fail_with(ProviderError::Http("connection reset".to_string()));
        assert_eq!(
            provider.list_webhooks("octo", "alpha").await,
            Err(ProviderError::Http("connection reset".to_string()))
        );
        assert_eq!(provider.call_count(), 2);
    }
}

// Repository Service - maps provider data onto the query shapes

use crate::domain::{
    Repository, RepositoryFile, RepositoryLean, RepositoryRef, RepositoryWebhook,
};
use crate::error::{AppError, Result};
use crate::port::{ProviderError, ProviderRepository, RepositoryProvider};
use std::sync::Arc;
use tracing::debug;

/// Extension marking a YAML file
const YML_SUFFIX: &str = ".yml";

#[derive(Clone)]
pub struct RepositoryService {
    provider: Arc<dyn RepositoryProvider>,
}

impl RepositoryService {
    pub fn new(provider: Arc<dyn RepositoryProvider>) -> Self {
        Self { provider }
    }

    /// All repositories of the authenticated account
    pub async fn list(&self) -> Result<Vec<RepositoryLean>> {
        let repositories = self
            .provider
            .list_repositories()
            .await
            .map_err(map_provider_error)?;

        Ok(repositories
            .into_iter()
            .map(|r| RepositoryLean {
                id: r.database_id,
                name: r.name,
                owner: r.owner_login,
                size: r.disk_usage,
            })
            .collect())
    }

    pub async fn get(&self, reference: &RepositoryRef) -> Result<Repository> {
        validate(reference)?;
        let found = self
            .provider
            .find_repository(&reference.owner, &reference.repo)
            .await
            .map_err(map_provider_error)?;
        Ok(to_repository(found))
    }

    /// Number of files on the default branch (or `branch` when given).
    /// Empty repositories have no files.
    pub async fn files_count(
        &self,
        reference: &RepositoryRef,
        branch: Option<String>,
    ) -> Result<usize> {
        let Some(branch) = self.branch(reference, branch).await? else {
            return Ok(0);
        };
        let tree = self
            .provider
            .list_tree(&reference.owner, &reference.repo, &branch)
            .await
            .map_err(map_provider_error)?;

        Ok(tree.iter().filter(|entry| entry.is_blob()).count())
    }

    /// First `.yml` file of the tree with its content
    pub async fn yml_file(
        &self,
        reference: &RepositoryRef,
        branch: Option<String>,
    ) -> Result<Option<RepositoryFile>> {
        let Some(branch) = self.branch(reference, branch).await? else {
            return Ok(None);
        };
        let tree = self
            .provider
            .list_tree(&reference.owner, &reference.repo, &branch)
            .await
            .map_err(map_provider_error)?;

        let Some(entry) = tree
            .into_iter()
            .find(|entry| entry.is_blob() && entry.path.ends_with(YML_SUFFIX))
        else {
            debug!(repository = %reference, "No yml file found");
            return Ok(None);
        };

        let content = self
            .provider
            .file_content(&reference.owner, &reference.repo, &entry.path)
            .await
            .map_err(map_provider_error)?;

        Ok(Some(RepositoryFile {
            path: entry.path,
            content,
        }))
    }

    pub async fn active_webhooks(
        &self,
        reference: &RepositoryRef,
    ) -> Result<Vec<RepositoryWebhook>> {
        validate(reference)?;
        let hooks = self
            .provider
            .list_webhooks(&reference.owner, &reference.repo)
            .await
            .map_err(map_provider_error)?;

        Ok(hooks
            .into_iter()
            .filter(|hook| hook.active)
            .map(|hook| RepositoryWebhook {
                id: hook.id,
                name: hook.name,
                url: hook.url,
            })
            .collect())
    }

    /// Explicit branch, or the repository's default branch
    async fn branch(
        &self,
        reference: &RepositoryRef,
        branch: Option<String>,
    ) -> Result<Option<String>> {
        validate(reference)?;
        match branch {
            Some(b) if !b.trim().is_empty() => Ok(Some(b)),
            _ => Ok(self.get(reference).await?.default_branch),
        }
    }
}

fn validate(reference: &RepositoryRef) -> Result<()> {
    if reference.owner.trim().is_empty() {
        return Err(AppError::Validation("owner must not be empty".to_string()));
    }
    if reference.repo.trim().is_empty() {
        return Err(AppError::Validation("repo must not be empty".to_string()));
    }
    Ok(())
}

fn to_repository(r: ProviderRepository) -> Repository {
    Repository {
        id: r.database_id,
        name: r.name,
        owner: r.owner_login,
        size: r.disk_usage,
        default_branch: r.default_branch,
        is_private: r.is_private,
    }
}

fn map_provider_error(err: ProviderError) -> AppError {
    match err {
        ProviderError::NotFound(what) => AppError::NotFound(what),
        other => AppError::Provider(other),
    }
}

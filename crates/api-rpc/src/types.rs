//! RPC Request/Response Types
//!
//! Results reuse the core query shapes (`RepositoryLean`, `Repository`,
//! `RepositoryFile`, `RepositoryWebhook`, `QueueSnapshot`).

use repogate_core::application::QueueSnapshot;
use repogate_core::domain::RepositoryRef;
use serde::{Deserialize, Serialize};

/// repository.*.v1 - Address a repository
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryRequest {
    pub owner: String,
    pub repo: String,
    /// Skips the repository lookup when the caller already knows the branch
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl RepositoryRequest {
    pub fn reference(&self) -> RepositoryRef {
        RepositoryRef::new(self.owner.clone(), self.repo.clone())
    }
}

/// repository.files_count.v1
#[derive(Debug, Clone, Serialize)]
pub struct FilesCountResponse {
    pub count: usize,
}

/// admin.queues.v1 - Queue statistics
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatsResponse {
    pub queues: Vec<QueueSnapshot>,
    pub uptime_seconds: i64,
}

//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types served by the gateway.

use serde::{Deserialize, Serialize};

/// Entry of `repositories.list.v1`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositorySummary {
    pub id: i64,
    pub name: String,
    pub owner: String,
    /// Disk usage in kilobytes
    pub size: i64,
}

/// Result of `repository.get.v1`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub owner: String,
    pub size: i64,
    pub default_branch: Option<String>,
    pub is_private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryFile {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryWebhook {
    pub id: i64,
    pub name: String,
    pub url: Option<String>,
}

/// Parameters of the `repository.*.v1` methods
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryRequest {
    pub owner: String,
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesCountResponse {
    pub count: usize,
}

/// Per-queue statistics
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueSnapshot {
    pub name: String,
    pub concurrency_limit: Option<usize>,
    pub default_timeout_ms: Option<u64>,
    pub pending: usize,
    pub running: usize,
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub created_at: i64,
}

/// Result of `admin.queues.v1`
#[derive(Debug, Clone, Deserialize)]
pub struct QueueStatsResponse {
    pub queues: Vec<QueueSnapshot>,
    pub uptime_seconds: i64,
}

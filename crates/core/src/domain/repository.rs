// Repository Domain Model (query interface output shapes)

use serde::{Deserialize, Serialize};

/// Repository summary returned by list queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryLean {
    pub id: i64,
    pub name: String,
    pub owner: String,
    /// Disk usage in kilobytes
    pub size: i64,
}

/// Full repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub owner: String,
    pub size: i64,
    /// `None` for empty repositories
    pub default_branch: Option<String>,
    pub is_private: bool,
}

impl Repository {
    pub fn reference(&self) -> RepositoryRef {
        RepositoryRef::new(self.owner.clone(), self.name.clone())
    }
}

/// A file with its decoded content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryFile {
    pub path: String,
    pub content: String,
}

/// An active webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryWebhook {
    pub id: i64,
    pub name: String,
    pub url: Option<String>,
}

/// `owner/repo` coordinates
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub repo: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

// RepoGate Infrastructure - GitHub Adapter
// Implements: RepositoryProvider (GraphQL for repository metadata, REST for trees, contents, hooks)

mod client;
mod config;
mod rate_limit;
mod wire;

pub use client::GitHubClient;
pub use config::GitHubConfig;

// Note: reqwest::Error conversion is done in helper functions
// (orphan rules: cannot implement From<reqwest::Error> for ProviderError here)

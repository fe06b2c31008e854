//! RepoGate SDK - Rust Client Library
//!
//! Provides a convenient client for the RepoGate GitHub gateway.
//!
//! # Example
//!
//! ```no_run
//! use repogate_sdk::RepoGateClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to the gateway
//!     let client = RepoGateClient::connect("http://127.0.0.1:9640").await?;
//!
//!     for repo in client.repositories().await? {
//!         println!("{}/{} ({} KB)", repo.owner, repo.name, repo.size);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::RepoGateClient;
pub use error::{code, Result, SdkError};
pub use types::{
    FilesCountResponse, QueueSnapshot, QueueStatsResponse, Repository, RepositoryFile,
    RepositoryRequest, RepositorySummary, RepositoryWebhook,
};

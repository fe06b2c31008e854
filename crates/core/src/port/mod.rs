// Port Layer - Interfaces for external dependencies

pub mod id_provider; // Invocation IDs (deterministic in tests)
pub mod repository_provider;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use repository_provider::{
    ProviderError, ProviderRepository, ProviderWebhook, RepositoryProvider, TreeEntry,
    TreeEntryKind,
};
pub use time_provider::TimeProvider;

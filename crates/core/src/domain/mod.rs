// Domain Layer - Pure business logic and entities

pub mod binding;
pub mod error;
pub mod queue;
pub mod repository;
pub mod task;

// Re-exports
pub use binding::{Binding, BindingTable, BindingTableBuilder, OperationId};
pub use error::DomainError;
pub use queue::{QueueConfig, QueueId};
pub use repository::{
    Repository, RepositoryFile, RepositoryLean, RepositoryRef, RepositoryWebhook,
};
pub use task::{TaskId, TaskState};

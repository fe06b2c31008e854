// Application Layer - Admission control and use cases

pub mod dispatch;
pub mod queue;
pub mod registry;
pub mod repositories;

// Re-exports
pub use dispatch::DispatchBridge;
pub use queue::{QueueSnapshot, TaskHandle, TaskOutcome, TaskQueue};
pub use registry::QueueRegistry;
pub use repositories::RepositoryService;

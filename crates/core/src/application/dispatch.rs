// Dispatch Bridge - routes bound operations through their named queue

use crate::application::queue::TaskOutcome;
use crate::application::registry::QueueRegistry;
use crate::domain::BindingTable;
use crate::error::{AppError, Result};
use crate::port::IdProvider;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

pub struct DispatchBridge {
    registry: Arc<QueueRegistry>,
    bindings: Arc<BindingTable>,
    id_provider: Arc<dyn IdProvider>,
}

impl DispatchBridge {
    /// # Errors
    /// - AppError::Domain if any binding describes an invalid queue
    pub fn new(
        registry: Arc<QueueRegistry>,
        bindings: Arc<BindingTable>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Result<Self> {
        bindings.validate()?;
        Ok(Self {
            registry,
            bindings,
            id_provider,
        })
    }

    pub fn registry(&self) -> &Arc<QueueRegistry> {
        &self.registry
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Invoke `operation` through its bound queue, or directly if unbound.
    ///
    /// The operation's own error is returned unchanged. A queue timeout
    /// surfaces as `AppError::Timeout`.
    pub async fn dispatch<T, F, Fut>(&self, operation: &str, call: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let Some(binding) = self.bindings.lookup(operation) else {
            return call().await;
        };

        let queue = self.registry.resolve(&binding.queue_config())?;
        let invocation_id = self.id_provider.generate_id();
        let started = Instant::now();

        debug!(
            invocation_id = %invocation_id,
            operation,
            queue = %binding.queue,
            "Starting execution in queue {}",
            binding.queue
        );

        let outcome = queue.submit(call, binding.timeout).await;

        debug!(
            invocation_id = %invocation_id,
            operation,
            queue = %binding.queue,
            duration_ms = started.elapsed().as_millis() as u64,
            state = %outcome.state(),
            "Execution completed in queue {}",
            binding.queue
        );

        match outcome {
            TaskOutcome::Completed(value) => Ok(value),
            TaskOutcome::Failed(err) => Err(err),
            TaskOutcome::TimedOut(limit) => Err(AppError::Timeout {
                queue: binding.queue.clone(),
                timeout_ms: limit.as_millis() as u64,
            }),
            TaskOutcome::Aborted(reason) => Err(AppError::Internal(format!(
                "Task in queue '{}' aborted: {}",
                binding.queue, reason
            ))),
        }
    }
}

// Queue Domain Model

use super::error::{DomainError, Result};
use std::time::Duration;

/// Queue identifier
pub type QueueId = String;

/// Queue configuration.
///
/// Immutable once a queue has been created from it. `concurrency: None`
/// means unbounded admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub name: QueueId,
    pub concurrency: Option<usize>,
    pub default_timeout: Option<Duration>,
}

impl QueueConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            concurrency: None,
            default_timeout: None,
        }
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = Some(limit);
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Effective slot count (`usize::MAX` when unbounded)
    pub fn slot_limit(&self) -> usize {
        self.concurrency.unwrap_or(usize::MAX)
    }

    /// Reject configurations that must never produce a queue.
    ///
    /// A zero concurrency bound would never admit anything, so it fails
    /// here instead of being coerced to unbounded.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(self.invalid("queue name cannot be empty"));
        }
        if self.concurrency == Some(0) {
            return Err(self.invalid("concurrency limit must be positive"));
        }
        if self.default_timeout == Some(Duration::ZERO) {
            return Err(self.invalid("timeout must be greater than zero"));
        }
        Ok(())
    }

    fn invalid(&self, reason: &str) -> DomainError {
        DomainError::InvalidQueueConfig {
            queue: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

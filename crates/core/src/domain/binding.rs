// Operation Binding Domain Model
//
// Bindings are declared once at startup and injected into the dispatch
// bridge as a lookup table keyed by operation name.

use super::error::Result;
use super::queue::QueueConfig;
use std::collections::HashMap;
use std::time::Duration;

/// Operation identifier (the RPC method name, e.g. `repository.get.v1`)
pub type OperationId = String;

/// Routes an operation through a named queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub queue: String,
    pub concurrency: Option<usize>,
    pub timeout: Option<Duration>,
}

impl Binding {
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            concurrency: None,
            timeout: None,
        }
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = Some(limit);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Queue configuration used when the registry resolves this binding.
    ///
    /// The timeout is not part of it: it travels with each submission.
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            name: self.queue.clone(),
            concurrency: self.concurrency,
            default_timeout: None,
        }
    }
}

/// Static operation -> binding table
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    bindings: HashMap<OperationId, Binding>,
}

impl BindingTable {
    pub fn builder() -> BindingTableBuilder {
        BindingTableBuilder::default()
    }

    pub fn lookup(&self, operation: &str) -> Option<&Binding> {
        self.bindings.get(operation)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.bindings.iter().map(|(op, b)| (op.as_str(), b))
    }

    /// Check every binding's queue configuration up front.
    ///
    /// The registry performs the same check lazily; calling this at startup
    /// turns a misconfigured binding into a boot failure.
    pub fn validate(&self) -> Result<()> {
        for binding in self.bindings.values() {
            let mut config = binding.queue_config();
            config.default_timeout = binding.timeout;
            config.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct BindingTableBuilder {
    bindings: HashMap<OperationId, Binding>,
}

impl BindingTableBuilder {
    /// Bind an operation; a later call for the same operation replaces it
    pub fn bind(mut self, operation: impl Into<String>, binding: Binding) -> Self {
        self.bindings.insert(operation.into(), binding);
        self
    }

    pub fn build(self) -> BindingTable {
        BindingTable {
            bindings: self.bindings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_bound_and_unbound() {
        let table = BindingTable::builder()
            .bind(
                "repository.get.v1",
                Binding::new("repository")
                    .with_concurrency(2)
                    .with_timeout(Duration::from_millis(5000)),
            )
            .build();

        let binding = table.lookup("repository.get.v1").unwrap();
        assert_eq!(binding.queue, "repository");
        assert_eq!(binding.concurrency, Some(2));
        assert_eq!(binding.timeout, Some(Duration::from_millis(5000)));
        assert!(table.lookup("repositories.list.v1").is_none());
    }

    #[test]
    fn test_queue_config_drops_timeout() {
        let binding = Binding::new("repository")
            .with_concurrency(2)
            .with_timeout(Duration::from_secs(5));
        let config = binding.queue_config();
        assert_eq!(config.name, "repository");
        assert_eq!(config.concurrency, Some(2));
        assert_eq!(config.default_timeout, None);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let table = BindingTable::builder()
            .bind("op", Binding::new("q").with_concurrency(0))
            .build();
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let table = BindingTable::builder()
            .bind("op", Binding::new("q").with_timeout(Duration::ZERO))
            .build();
        assert!(table.validate().is_err());
    }
}

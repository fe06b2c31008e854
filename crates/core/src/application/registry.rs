// Queue Registry - process-wide name -> queue map
//
// Queues are created lazily on first reference and never removed.

use crate::application::queue::{QueueSnapshot, TaskQueue};
use crate::domain::QueueConfig;
use crate::error::Result;
use crate::port::TimeProvider;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub struct QueueRegistry {
    queues: RwLock<HashMap<String, Arc<TaskQueue>>>,
    time_provider: Arc<dyn TimeProvider>,
}

impl QueueRegistry {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            time_provider,
        }
    }

    /// Return the queue named `config.name`, creating it on first use.
    ///
    /// The first config seen for a name wins; later differing configs are
    /// ignored.
    ///
    /// # Errors
    /// - AppError::Domain if the queue has to be created and `config` is invalid
    pub fn resolve(&self, config: &QueueConfig) -> Result<Arc<TaskQueue>> {
        if let Some(existing) = self.queues.read().get(&config.name) {
            return Ok(Self::reuse(existing, config));
        }

        let mut queues = self.queues.write();
        // Another caller may have created it between the two locks
        if let Some(existing) = queues.get(&config.name) {
            return Ok(Self::reuse(existing, config));
        }

        let queue = Arc::new(TaskQueue::new(
            config.clone(),
            self.time_provider.now_millis(),
        )?);
        info!(
            queue = %config.name,
            concurrency = ?config.concurrency,
            timeout_ms = ?config.default_timeout.map(|d| d.as_millis() as u64),
            "Queue created"
        );
        queues.insert(config.name.clone(), queue.clone());
        Ok(queue)
    }

    fn reuse(existing: &Arc<TaskQueue>, requested: &QueueConfig) -> Arc<TaskQueue> {
        if existing.config() != requested {
            debug!(
                queue = %requested.name,
                "Queue already exists, ignoring differing configuration"
            );
        }
        existing.clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<TaskQueue>> {
        self.queues.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.queues.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.read().is_empty()
    }

    /// Snapshots of all queues, sorted by name
    pub fn snapshot(&self) -> Vec<QueueSnapshot> {
        let mut snapshots: Vec<_> = self.queues.read().values().map(|q| q.snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::port::time_provider::FixedTimeProvider;
    use std::time::Duration;

    fn registry() -> QueueRegistry {
        QueueRegistry::new(Arc::new(FixedTimeProvider(1_700_000_000_000)))
    }

    #[test]
    fn test_resolve_returns_identical_queue() {
        let registry = registry();
        let config = QueueConfig::new("repository").with_concurrency(2);

        let first = registry.resolve(&config).unwrap();
        let second = registry.resolve(&config).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert_eq!(first.snapshot().created_at, 1_700_000_000_000);
    }

    #[test]
    fn test_later_config_is_ignored() {
        let registry = registry();
        let first = registry
            .resolve(&QueueConfig::new("repository").with_concurrency(2))
            .unwrap();
        let second = registry
            .resolve(
                &QueueConfig::new("repository")
                    .with_concurrency(10)
                    .with_default_timeout(Duration::from_secs(1)),
            )
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.config().concurrency, Some(2));
        assert_eq!(second.config().default_timeout, None);
    }

    #[test]
    fn test_invalid_config_fails_at_creation() {
        let registry = registry();
        let err = registry
            .resolve(&QueueConfig::new("repository").with_concurrency(0))
            .unwrap_err();

        assert!(matches!(err, AppError::Domain(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_free_form_names_resolve() {
        let registry = registry();
        let long_name = "n".repeat(80);
        for name in ["github repository", "repos/get", long_name.as_str()] {
            let queue = registry.resolve(&QueueConfig::new(name)).unwrap();
            assert_eq!(queue.name(), name);
        }
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_distinct_names_get_distinct_queues() {
        let registry = registry();
        let a = registry.resolve(&QueueConfig::new("b-queue")).unwrap();
        let b = registry.resolve(&QueueConfig::new("a-queue")).unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        let names: Vec<_> = registry.snapshot().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["a-queue", "b-queue"]);
        assert!(registry.get("a-queue").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_concurrent_first_access_creates_one_queue() {
        let registry = Arc::new(registry());
        let config = QueueConfig::new("repository").with_concurrency(2);

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let config = config.clone();
                std::thread::spawn(move || registry.resolve(&config).unwrap())
            })
            .collect();
        let queues: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();

        assert_eq!(registry.len(), 1);
        assert!(queues.iter().all(|q| Arc::ptr_eq(q, &queues[0])));
    }
}

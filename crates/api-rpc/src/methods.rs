//! RPC Method Names and Queue Bindings

use repogate_core::domain::{Binding, BindingTable};
use std::time::Duration;

pub const REPOSITORIES_LIST: &str = "repositories.list.v1";
pub const REPOSITORY_GET: &str = "repository.get.v1";
pub const REPOSITORY_FILES_COUNT: &str = "repository.files_count.v1";
pub const REPOSITORY_YML_FILE: &str = "repository.yml_file.v1";
pub const REPOSITORY_WEBHOOKS: &str = "repository.webhooks.v1";
pub const ADMIN_QUEUES: &str = "admin.queues.v1";

/// Queue guarding single-repository lookups
pub const REPOSITORY_QUEUE: &str = "repository";
pub const DEFAULT_REPOSITORY_CONCURRENCY: usize = 2;
pub const DEFAULT_REPOSITORY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Bindings served by the gateway: `repository.get.v1` runs through the
/// `repository` queue, everything else executes directly.
pub fn default_bindings(concurrency: usize, timeout: Duration) -> BindingTable {
    BindingTable::builder()
        .bind(
            REPOSITORY_GET,
            Binding::new(REPOSITORY_QUEUE)
                .with_concurrency(concurrency)
                .with_timeout(timeout),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_repository_get_is_bound() {
        let table = default_bindings(DEFAULT_REPOSITORY_CONCURRENCY, DEFAULT_REPOSITORY_TIMEOUT);

        assert_eq!(table.len(), 1);
        let binding = table.lookup(REPOSITORY_GET).unwrap();
        assert_eq!(binding.queue, REPOSITORY_QUEUE);
        assert_eq!(binding.concurrency, Some(2));
        assert_eq!(binding.timeout, Some(Duration::from_millis(5000)));
        assert!(table.lookup(REPOSITORIES_LIST).is_none());
        assert!(table.validate().is_ok());
    }
}

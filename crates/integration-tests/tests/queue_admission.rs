//! Queue admission through the dispatch bridge
//!
//! Runs the gateway's bindings against an in-memory provider on a paused
//! clock, so every latency and timeout below is simulated time.

use std::sync::Arc;
use std::time::Duration;

use repogate_api_rpc::default_bindings;
use repogate_api_rpc::methods::{REPOSITORIES_LIST, REPOSITORY_GET, REPOSITORY_QUEUE};
use repogate_core::application::{DispatchBridge, QueueRegistry, RepositoryService};
use repogate_core::domain::{Repository, RepositoryLean, RepositoryRef};
use repogate_core::error::{AppError, Result};
use repogate_core::port::id_provider::SequentialIdProvider;
use repogate_core::port::repository_provider::mocks::MockRepositoryProvider;
use repogate_core::port::time_provider::FixedTimeProvider;
use repogate_core::port::ProviderRepository;
use tokio::time::Instant;

fn fixture(name: &str) -> ProviderRepository {
    ProviderRepository {
        database_id: name.len() as i64,
        name: name.to_string(),
        owner_login: "octo".to_string(),
        disk_usage: 42,
        is_private: false,
        default_branch: Some("main".to_string()),
    }
}

#[derive(Clone)]
struct Gateway {
    bridge: Arc<DispatchBridge>,
    service: RepositoryService,
}

impl Gateway {
    fn new(provider: MockRepositoryProvider, concurrency: usize, timeout: Duration) -> Self {
        let registry = Arc::new(QueueRegistry::new(Arc::new(FixedTimeProvider(1_700_000_000))));
        let bridge = DispatchBridge::new(
            registry,
            Arc::new(default_bindings(concurrency, timeout)),
            Arc::new(SequentialIdProvider::default()),
        )
        .unwrap();

        Self {
            bridge: Arc::new(bridge),
            service: RepositoryService::new(Arc::new(provider)),
        }
    }

    async fn get(&self, repo: &str) -> Result<Repository> {
        let service = self.service.clone();
        let reference = RepositoryRef::new("octo", repo);
        self.bridge
            .dispatch(REPOSITORY_GET, move || async move {
                service.get(&reference).await
            })
            .await
    }

    async fn list(&self) -> Result<Vec<RepositoryLean>> {
        let service = self.service.clone();
        self.bridge
            .dispatch(REPOSITORIES_LIST, move || async move { service.list().await })
            .await
    }

    fn spawn_get(
        &self,
        repo: &'static str,
        start: Instant,
    ) -> tokio::task::JoinHandle<(Result<Repository>, Duration)> {
        let gateway = self.clone();
        tokio::spawn(async move {
            let result = gateway.get(repo).await;
            (result, start.elapsed())
        })
    }
}

fn within(elapsed: Duration, expected_ms: u64) -> bool {
    let ms = elapsed.as_millis() as u64;
    ms >= expected_ms && ms < expected_ms + 100
}

/// Two slots: the third lookup starts only when one of the first two finishes
#[tokio::test(start_paused = true)]
async fn test_third_lookup_waits_for_free_slot() {
    let provider = MockRepositoryProvider::new()
        .with_repository(fixture("a"))
        .with_repository(fixture("b"))
        .with_repository(fixture("c"))
        .with_latency_for("a", Duration::from_millis(3000))
        .with_latency_for("b", Duration::from_millis(3000))
        .with_latency_for("c", Duration::from_millis(1000));
    let gateway = Gateway::new(provider, 2, Duration::from_millis(5000));

    let start = Instant::now();
    let handles = vec![
        gateway.spawn_get("a", start),
        gateway.spawn_get("b", start),
        gateway.spawn_get("c", start),
    ];

    let mut elapsed = Vec::new();
    for handle in handles {
        let (result, took) = handle.await.unwrap();
        assert_eq!(result.unwrap().owner, "octo");
        elapsed.push(took);
    }
    elapsed.sort();

    // A and B hold both slots for 3000ms, C runs 1000ms after that
    assert!(within(elapsed[0], 3000), "first finished at {:?}", elapsed[0]);
    assert!(within(elapsed[1], 3000), "second finished at {:?}", elapsed[1]);
    assert!(within(elapsed[2], 4000), "third finished at {:?}", elapsed[2]);

    let snapshot = gateway.bridge.registry().get(REPOSITORY_QUEUE).unwrap().snapshot();
    assert_eq!(snapshot.submitted, 3);
    assert_eq!(snapshot.completed, 3);
    assert_eq!(snapshot.running, 0);
    assert_eq!(snapshot.pending, 0);
}

/// A lookup running past the queue timeout fails with a timeout error and
/// frees its slot for the next one
#[tokio::test(start_paused = true)]
async fn test_slow_lookup_times_out_and_releases_slot() {
    let provider = MockRepositoryProvider::new()
        .with_repository(fixture("slow"))
        .with_repository(fixture("next"))
        .with_latency(Duration::from_millis(2000))
        .with_latency_for("slow", Duration::from_millis(6000));
    let gateway = Gateway::new(provider, 1, Duration::from_millis(5000));

    let start = Instant::now();
    let slow = gateway.spawn_get("slow", start);
    tokio::task::yield_now().await;
    let next = gateway.spawn_get("next", start);

    let (result, took) = slow.await.unwrap();
    match result {
        Err(AppError::Timeout { queue, timeout_ms }) => {
            assert_eq!(queue, REPOSITORY_QUEUE);
            assert_eq!(timeout_ms, 5000);
        }
        other => panic!("expected queue timeout, got {:?}", other),
    }
    assert!(within(took, 5000), "timed out at {:?}", took);

    let (result, took) = next.await.unwrap();
    assert_eq!(result.unwrap().name, "next");
    assert!(within(took, 7000), "next finished at {:?}", took);

    let snapshot = gateway.bridge.registry().get(REPOSITORY_QUEUE).unwrap().snapshot();
    assert_eq!(snapshot.timed_out, 1);
    assert_eq!(snapshot.completed, 1);
}

/// Unbound methods never touch a queue, even while the bound queue is full
#[tokio::test(start_paused = true)]
async fn test_unbound_method_bypasses_saturated_queue() {
    let provider = MockRepositoryProvider::new()
        .with_repository(fixture("a"))
        .with_repository(fixture("b"))
        .with_latency_for("a", Duration::from_millis(3000))
        .with_latency_for("b", Duration::from_millis(3000));
    let gateway = Gateway::new(provider, 2, Duration::from_millis(5000));

    let list = gateway.list().await.unwrap();
    assert_eq!(list.len(), 2);
    assert!(gateway.bridge.registry().is_empty());

    let start = Instant::now();
    let a = gateway.spawn_get("a", start);
    let b = gateway.spawn_get("b", start);
    let registry = gateway.bridge.registry().clone();
    let running = || registry.get(REPOSITORY_QUEUE).map(|q| q.snapshot().running);
    for _ in 0..16 {
        if running() == Some(2) {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(running(), Some(2));
    let queue = registry.get(REPOSITORY_QUEUE).unwrap();

    let listed_at = Instant::now();
    let list = gateway.list().await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(listed_at.elapsed(), Duration::ZERO);
    assert_eq!(queue.snapshot().submitted, 2);

    assert!(a.await.unwrap().0.is_ok());
    assert!(b.await.unwrap().0.is_ok());
    assert_eq!(gateway.bridge.registry().len(), 1);
}

/// Provider errors come back unchanged through the queue
#[tokio::test(start_paused = true)]
async fn test_not_found_passes_through_queue() {
    let gateway = Gateway::new(MockRepositoryProvider::new(), 2, Duration::from_millis(5000));

    let err = gateway.get("missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);

    let snapshot = gateway.bridge.registry().get(REPOSITORY_QUEUE).unwrap().snapshot();
    assert_eq!(snapshot.failed, 1);
    assert_eq!(snapshot.completed, 0);
}

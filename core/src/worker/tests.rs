//! Integration tests for the Worker module

use super::*;
use crate::config::ScenarioConfig;
use crate::metrics::MetricsAggregator;
use crate::outcome::Outcome;
use crate::pool::IterationPool;
use crate::testing::StubClient;
use crate::workflow::IterationWorkflow;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

// ============================================================================
// Helper functions
// ============================================================================

struct Fixture {
    worker: Worker,
    pool: Arc<IterationPool>,
    metrics: Arc<MetricsAggregator>,
    shutdown_tx: watch::Sender<bool>,
}

fn create_test_worker(
    id: usize,
    client: Arc<StubClient>,
    iterations: usize,
    rate_limit: Option<f64>,
) -> Fixture {
    let config = ScenarioConfig::for_backend("localhost:8080").unwrap();
    let metrics = Arc::new(MetricsAggregator::new());
    let pool = Arc::new(IterationPool::new(iterations));
    let workflow = Arc::new(IterationWorkflow::new(client, Arc::clone(&metrics), &config));
    let (shutdown_tx, _) = watch::channel(false);

    let worker = WorkerBuilder::new(id)
        .pool(Arc::clone(&pool))
        .rate_limiter(Arc::new(RequestRateLimiter::new(rate_limit, 1)))
        .workflow(workflow)
        .build()
        .expect("Failed to build worker");

    Fixture {
        worker,
        pool,
        metrics,
        shutdown_tx,
    }
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn test_worker_drains_pool() {
    let client = Arc::new(StubClient::admitting());
    let fixture = create_test_worker(0, Arc::clone(&client), 5, None);

    let shutdown_rx = fixture.shutdown_tx.subscribe();
    let stats = fixture.worker.run(shutdown_rx).await;

    assert_eq!(stats.admitted, 5);
    assert_eq!(stats.total_iterations(), 5);
    assert!(fixture.pool.is_exhausted());
    assert_eq!(fixture.metrics.snapshot().pool_is_not_full, 5);
    assert_eq!(client.logins_for("test_user_1"), 5);
}

#[tokio::test]
async fn test_worker_plays_one_based_user() {
    let client = Arc::new(StubClient::admitting());
    let fixture = create_test_worker(6, Arc::clone(&client), 2, None);

    let shutdown_rx = fixture.shutdown_tx.subscribe();
    fixture.worker.run(shutdown_rx).await;

    assert_eq!(client.logins_for("test_user_7"), 2);
    assert_eq!(client.distinct_users(), 1);
}

#[tokio::test]
async fn test_worker_counts_failures_without_retry() {
    let client = Arc::new(StubClient::admitting().with_login_status(500));
    let fixture = create_test_worker(0, Arc::clone(&client), 4, None);

    let shutdown_rx = fixture.shutdown_tx.subscribe();
    let stats = fixture.worker.run(shutdown_rx).await;

    assert_eq!(stats.auth_failed, 4);
    assert_eq!(stats.total_iterations(), 4);
    assert_eq!(client.total_logins(), 4);
    assert_eq!(client.connect_calls(), 0);
}

#[tokio::test]
async fn test_worker_rejected_iterations() {
    let client = Arc::new(StubClient::with_connect_status(503));
    let fixture = create_test_worker(0, client, 3, None);

    let shutdown_rx = fixture.shutdown_tx.subscribe();
    let stats = fixture.worker.run(shutdown_rx).await;

    assert_eq!(stats.count(Outcome::Rejected), 3);
    assert_eq!(fixture.metrics.snapshot().pool_is_full, 3);
}

#[tokio::test]
async fn test_worker_exits_on_empty_pool() {
    let client = Arc::new(StubClient::admitting());
    let fixture = create_test_worker(0, Arc::clone(&client), 0, None);

    let shutdown_rx = fixture.shutdown_tx.subscribe();
    let stats = fixture.worker.run(shutdown_rx).await;

    assert_eq!(stats.total_iterations(), 0);
    assert_eq!(client.total_logins(), 0);
}

#[tokio::test]
async fn test_worker_shutdown_before_claim() {
    let client = Arc::new(StubClient::admitting());
    let fixture = create_test_worker(0, Arc::clone(&client), 10, None);

    let shutdown_rx = fixture.shutdown_tx.subscribe();
    fixture.shutdown_tx.send_replace(true);

    let stats = fixture.worker.run(shutdown_rx).await;

    assert_eq!(stats.total_iterations(), 0);
    assert_eq!(fixture.pool.remaining(), 10);
}

#[tokio::test]
async fn test_worker_subscribed_after_shutdown_claims_nothing() {
    let client = Arc::new(StubClient::admitting());
    let fixture = create_test_worker(0, Arc::clone(&client), 10, None);

    // Raised while nobody is listening
    fixture.shutdown_tx.send_replace(true);
    let shutdown_rx = fixture.shutdown_tx.subscribe();

    let stats = fixture.worker.run(shutdown_rx).await;

    assert_eq!(stats.total_iterations(), 0);
    assert_eq!(fixture.pool.claimed(), 0);
    assert_eq!(client.total_logins(), 0);
}

#[tokio::test]
async fn test_worker_shutdown_mid_run_finishes_claimed_iteration() {
    let client = Arc::new(StubClient::admitting().with_delay(Duration::from_millis(30)));
    let fixture = create_test_worker(0, Arc::clone(&client), 1000, None);

    let shutdown_rx = fixture.shutdown_tx.subscribe();
    let worker = fixture.worker;
    let handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    fixture.shutdown_tx.send_replace(true);

    let stats = handle.await.expect("Worker task panicked");

    assert!(stats.total_iterations() >= 1);
    assert!(stats.total_iterations() < 1000);
    // Every claimed iteration was recorded
    assert_eq!(stats.total_iterations(), fixture.pool.claimed());
    assert_eq!(fixture.metrics.total() as usize, fixture.pool.claimed());
}

#[tokio::test]
async fn test_worker_with_rate_limit() {
    let client = Arc::new(StubClient::admitting());
    let fixture = create_test_worker(0, client, 5, Some(50.0));

    let start = Instant::now();
    let shutdown_rx = fixture.shutdown_tx.subscribe();
    let stats = fixture.worker.run(shutdown_rx).await;

    assert_eq!(stats.admitted, 5);
    // First admission is immediate, the remaining four are 20ms apart
    assert!(start.elapsed() >= Duration::from_millis(75));
}

#[tokio::test]
async fn test_worker_stats_tracking() {
    let client = Arc::new(StubClient::admitting());
    let fixture = create_test_worker(0, client, 3, None);

    let shutdown_rx = fixture.shutdown_tx.subscribe();
    let stats = fixture.worker.run(shutdown_rx).await;

    assert_eq!(stats.admitted, 3);
    assert!(stats.elapsed().is_some());
    assert!(stats.ended_at.is_some());
    assert!((stats.admission_rate() - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_workers_share_pool() {
    let client = Arc::new(StubClient::admitting().with_delay(Duration::from_millis(1)));
    let config = ScenarioConfig::for_backend("localhost:8080").unwrap();
    let metrics = Arc::new(MetricsAggregator::new());
    let pool = Arc::new(IterationPool::new(40));
    let limiter = Arc::new(RequestRateLimiter::unlimited());
    let workflow = Arc::new(IterationWorkflow::new(
        client.clone(),
        Arc::clone(&metrics),
        &config,
    ));
    let (shutdown_tx, _) = watch::channel(false);

    let handles: Vec<_> = (0..4)
        .map(|id| {
            let worker = WorkerBuilder::new(id)
                .pool(Arc::clone(&pool))
                .rate_limiter(Arc::clone(&limiter))
                .workflow(Arc::clone(&workflow))
                .build()
                .expect("Failed to build worker");
            let shutdown_rx = shutdown_tx.subscribe();
            tokio::spawn(async move { worker.run(shutdown_rx).await })
        })
        .collect();

    let mut total = 0;
    for handle in handles {
        total += handle.await.expect("Worker task panicked").total_iterations();
    }

    assert_eq!(total, 40);
    assert_eq!(metrics.total(), 40);
    assert_eq!(client.total_logins(), 40);
    assert_eq!(client.distinct_users(), 4);
}

//! End-to-end lifecycle scenarios: submission, completion, failure, event
//! ring behavior, and id reuse.

mod common;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use jobmux::{Clock, JobEventKind, JobManager, JobStatus, ManagerConfig};
use tokio::sync::Notify;

use common::{faulty, gated, notifier, wait_until, Id};

#[tokio::test]
async fn three_jobs_complete_with_per_job_notification_order() {
    let manager = JobManager::<Id, u64, u64>::new(ManagerConfig {
        job_limit: 4,
        notifications_limit: 8,
        events_limit: 4,
        job_concurrency: 2,
    });
    let mut notifications = manager.notifications();
    let mut events = manager.events();

    for id in ["a", "b", "c"] {
        assert!(manager.submit(notifier(id, vec![1, 2])).await);
    }

    let mut per_id: HashMap<Id, Vec<u64>> = HashMap::new();
    for _ in 0..6 {
        let (id, n) = notifications.next().await.expect("six notifications");
        per_id.entry(id).or_default().push(n);
    }
    for id in ["a", "b", "c"] {
        assert_eq!(per_id[id], vec![1, 2], "per-job order for {id}");
    }

    let mut completed = HashSet::new();
    for _ in 0..3 {
        let event = events.next().await.expect("three events");
        assert_eq!(event.kind, JobEventKind::Completed);
        assert!(completed.insert(event.id), "one event per id");
    }

    assert!(wait_until(|| manager.job_ids().is_empty()).await);
}

#[tokio::test]
async fn duplicate_submit_is_rejected_and_id_reusable_after_completion() {
    let manager = JobManager::<Id, u64, u64>::new(ManagerConfig::default());
    let mut events = manager.events();
    let gate = Arc::new(Notify::new());

    assert!(manager.submit(gated("a", Arc::clone(&gate))).await);
    // second submission of the same id: rejected, no side effects
    assert!(!manager.submit(notifier("a", vec![9])).await);

    gate.notify_one();
    let event = events.next().await.expect("completion event");
    assert_eq!(event.kind, JobEventKind::Completed);
    assert_eq!(event.id, "a");
    assert!(wait_until(|| manager.job_ids().is_empty()).await);

    // exactly one event was emitted for "a"
    assert_eq!(manager.last_events(8), Some(vec![]));

    // the id is free again once the job terminated
    assert!(manager.submit(notifier("a", vec![1])).await);
    let event = events.next().await.expect("second lifetime event");
    assert_eq!(event.id, "a");
}

#[tokio::test]
async fn failing_job_emits_failed_event_after_its_notifications() {
    let manager = JobManager::<Id, u64, u64>::new(ManagerConfig::default());
    let mut notifications = manager.notifications();
    let mut events = manager.events();

    assert!(manager.submit(faulty("a", "boom")).await);

    assert_eq!(
        notifications.next().await,
        Some(("a".to_string(), 1)),
        "the notification precedes the event"
    );

    let event = events.next().await.expect("failure event");
    assert_eq!(event.kind, JobEventKind::Failed);
    assert_eq!(event.id, "a");
    let error = event.error.expect("failure carries its error");
    assert!(error.contains("boom"), "got: {error}");

    assert!(wait_until(|| manager.status(&"a".to_string()).is_none()).await);
}

#[tokio::test]
async fn events_ring_of_one_keeps_only_the_newest() {
    let manager = JobManager::<Id, u64, u64>::new(ManagerConfig {
        events_limit: 1,
        ..ManagerConfig::default()
    });

    assert!(manager.submit(notifier("a", vec![])).await);
    assert!(wait_until(|| manager.job_ids().is_empty()).await);
    assert!(manager.submit(notifier("b", vec![])).await);
    assert!(wait_until(|| manager.job_ids().is_empty()).await);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let events = manager.last_events(8).expect("ring open");
    assert_eq!(events.len(), 1, "older event was discarded");
    assert_eq!(events[0].id, "b");
}

#[tokio::test]
async fn saturated_dispatch_parks_submit_with_the_job_already_pending() {
    use futures::FutureExt;

    let manager = JobManager::<Id, u64, u64>::new(ManagerConfig {
        job_limit: 1,
        job_concurrency: 1,
        ..ManagerConfig::default()
    });
    let gate = Arc::new(Notify::new());

    // "a" occupies the single runner slot
    assert!(manager.submit(gated("a", Arc::clone(&gate))).await);
    assert!(wait_until(|| manager.status(&"a".to_string()) == Some(JobStatus::Running)).await);

    // "b" fills the dispatch queue
    assert!(manager.submit(notifier("b", vec![])).await);

    // "c" must park on the saturated queue, already visible as Pending
    let mut parked = Box::pin(manager.submit(notifier("c", vec![])));
    assert!((&mut parked).now_or_never().is_none(), "submit should park");
    assert_eq!(manager.status(&"c".to_string()), Some(JobStatus::Pending));

    gate.notify_one();
    assert!(parked.await, "parked submit completes once space frees");
    assert!(wait_until(|| manager.job_ids().is_empty()).await);
}

struct TestClock(AtomicU64);

impl Clock for TestClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn event_timing_is_measured_from_submission() {
    let clock = Arc::new(TestClock(AtomicU64::new(1_000)));
    let manager = JobManager::<Id, u64, u64>::with_clock(
        ManagerConfig::default(),
        Arc::clone(&clock) as Arc<dyn Clock>,
    );
    let mut events = manager.events();
    let gate = Arc::new(Notify::new());

    assert!(manager.submit(gated("a", Arc::clone(&gate))).await);
    clock.0.store(1_750, Ordering::SeqCst);
    gate.notify_one();

    let event = events.next().await.expect("completion event");
    assert_eq!(event.started_at, 1_000);
    assert_eq!(event.duration, Duration::from_millis(750));
}

//! Cancellation, concurrency capping, and shutdown behavior.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use jobmux::{JobManager, JobStatus, ManagerConfig};
use tokio::sync::Notify;

use common::{gated, notifier, ticker, wait_until, Id};

fn roomy() -> ManagerConfig {
    // plenty of notification headroom so unconsumed tickers never wedge
    ManagerConfig {
        notifications_limit: 1024,
        ..ManagerConfig::default()
    }
}

#[tokio::test]
async fn cancel_running_job_is_silent_and_frees_the_id() {
    let manager = JobManager::<Id, u64, u64>::new(roomy());
    let id = "a".to_string();

    assert!(manager.submit(ticker("a")).await);
    assert!(wait_until(|| manager.status(&id) == Some(JobStatus::Running)).await);

    manager.cancel(&id);
    assert!(wait_until(|| manager.status(&id).is_none()).await);

    // silent: no event for a cancelled job
    assert_eq!(manager.last_events(8), Some(vec![]));

    // production stopped: the queue goes quiet once the runner wound down
    let _ = manager.last_notifications(2048);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(manager.last_notifications(2048), Some(vec![]));

    // the manager stays healthy for new submissions
    assert!(manager.submit(notifier("b", vec![1])).await);
    assert!(wait_until(|| manager.job_ids().is_empty()).await);
}

#[tokio::test]
async fn cancel_pending_job_never_runs_and_emits_nothing() {
    let manager = JobManager::<Id, u64, u64>::new(ManagerConfig {
        job_concurrency: 1,
        ..roomy()
    });
    let gate = Arc::new(Notify::new());

    assert!(manager.submit(gated("a", Arc::clone(&gate))).await);
    assert!(wait_until(|| manager.status(&"a".to_string()) == Some(JobStatus::Running)).await);

    // "b" is queued behind the single runner slot
    assert!(manager.submit(notifier("b", vec![7])).await);
    assert_eq!(manager.status(&"b".to_string()), Some(JobStatus::Pending));

    manager.cancel(&"b".to_string());
    assert_eq!(manager.status(&"b".to_string()), Some(JobStatus::Canceled));

    // repeated cancels are a no-op, as is cancelling an unknown id
    manager.cancel(&"b".to_string());
    manager.cancel(&"ghost".to_string());

    gate.notify_one();
    assert!(wait_until(|| manager.job_ids().is_empty()).await);

    // only "a" completed; "b" never ran and produced neither notification
    // nor event
    let events = manager.last_events(8).expect("ring open");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "a");
    let notifications = manager.last_notifications(16).expect("queue open");
    assert!(notifications.iter().all(|(id, _)| id == "a"));
}

#[tokio::test]
async fn single_slot_keeps_second_job_pending_until_the_first_ends() {
    let manager = JobManager::<Id, u64, u64>::new(ManagerConfig {
        job_concurrency: 1,
        ..roomy()
    });
    let gate = Arc::new(Notify::new());

    assert!(manager.submit(gated("a", Arc::clone(&gate))).await);
    assert!(manager.submit(notifier("b", vec![1])).await);

    assert!(wait_until(|| manager.status(&"a".to_string()) == Some(JobStatus::Running)).await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(
        manager.status(&"b".to_string()),
        Some(JobStatus::Pending),
        "second job must not start while the slot is held"
    );

    gate.notify_one();
    assert!(wait_until(|| manager.job_ids().is_empty()).await);
}

#[tokio::test]
async fn shutdown_terminates_streams_and_rejects_new_work() {
    let manager = JobManager::<Id, u64, u64>::new(roomy());
    let mut notifications = manager.notifications();
    let mut events = manager.events();

    assert!(manager.submit(ticker("a")).await);
    assert!(wait_until(|| manager.status(&"a".to_string()) == Some(JobStatus::Running)).await);

    manager.shutdown();

    // both streams drain and terminate; a full queue cannot wedge this
    let drained = tokio::time::timeout(Duration::from_secs(1), async {
        while notifications.next().await.is_some() {}
        while events.next().await.is_some() {}
    })
    .await;
    assert!(drained.is_ok(), "streams must terminate after shutdown");

    assert!(manager.job_ids().is_empty());
    assert_eq!(manager.last_notifications(8), None);
    assert_eq!(manager.last_events(8), None);
    assert!(!manager.submit(notifier("b", vec![1])).await);

    // idempotent
    manager.shutdown();
}

#[tokio::test]
async fn dropping_the_last_handle_shuts_down() {
    let manager = JobManager::<Id, u64, u64>::new(ManagerConfig::default());
    let mut events = manager.events();
    drop(manager);
    assert_eq!(events.next().await, None);
}

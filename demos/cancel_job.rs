//! # Example: cancel_job
//!
//! Demonstrates how to cancel a running job at runtime.
//!
//! Shows how to:
//! - Start a long-running job that notifies forever
//! - Cancel it by id using [`JobManager::cancel`]
//! - Verify removal via `status` polling (cancellation emits no event)
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► submit "worker" (endless notifier)
//!   ├─► drain its notifications for a while
//!   ├─► cancel("worker")
//!   │     ├─► registry: Running → token raised
//!   │     └─► runner stops at its next suspension point, no event
//!   └─► verify status("worker") turns None, manager stays healthy
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example cancel_job
//! ```

use std::time::Duration;

use futures::{stream, StreamExt};
use jobmux::{JobFn, JobItem, JobManager, JobRef, JobStatus, ManagerConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    println!("=== cancel_job example ===\n");

    let manager = JobManager::<String, u64, u64>::new(ManagerConfig::default());

    // 1. A job that ticks forever; only cancellation stops it.
    let worker: JobRef<String, u64, u64> = JobFn::arc("worker".to_string(), || {
        stream::unfold(0u64, |n| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Some((Ok(JobItem::Notification(n)), n + 1))
        })
    });
    assert!(manager.submit(worker).await);

    // 2. Watch a few ticks come through the shared stream.
    let mut notifications = manager.notifications();
    for _ in 0..5 {
        if let Some((id, n)) = notifications.next().await {
            println!("[notification] {id}: tick #{n}");
        }
    }
    println!(
        "\n[controller] worker status: {:?}",
        manager.status(&"worker".to_string())
    );
    assert_eq!(
        manager.status(&"worker".to_string()),
        Some(JobStatus::Running)
    );

    // 3. Cancel and wait for the registry entry to disappear.
    println!("[controller] cancelling 'worker'...");
    manager.cancel(&"worker".to_string());
    while manager.status(&"worker".to_string()).is_some() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    println!("[controller] worker is gone (no event: cancellation is silent)");
    assert_eq!(manager.last_events(8), Some(vec![]));

    // flush ticks the worker queued after we stopped reading the stream
    if let Some(leftover) = manager.last_notifications(64) {
        println!("[controller] drained {} leftover ticks", leftover.len());
    }

    // 4. The manager keeps serving new work.
    let follow_up: JobRef<String, u64, u64> = JobFn::arc("follow-up".to_string(), || {
        stream::iter(vec![Ok(JobItem::Notification(1))])
    });
    assert!(manager.submit(follow_up).await);
    let mut events = manager.events();
    if let Some(event) = events.next().await {
        println!("[event] {}: {:?}", event.id, event.kind);
    }

    manager.shutdown();
    println!("\n=== example completed successfully ===");
    Ok(())
}

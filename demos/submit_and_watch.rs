//! # Example: submit_and_watch
//!
//! Demonstrates the basic submit path: several jobs run concurrently while
//! their progress notifications merge into one shared stream and their
//! completions arrive as lifecycle events.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► create JobManager (bounded queues, dispatcher)
//!   ├─► spawn notification printer (shared stream)
//!   ├─► submit "alpha", "beta", "gamma"
//!   ├─► await three Completed events
//!   └─► shutdown (streams terminate, printer exits)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example submit_and_watch
//! ```

use futures::{stream, StreamExt};
use jobmux::{JobFn, JobItem, JobManager, JobRef, ManagerConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    println!("=== submit_and_watch example ===\n");

    // 1. Create the manager with default capacities.
    let manager = JobManager::<String, u64, u64>::new(ManagerConfig::default());

    // 2. Print every notification from the shared stream in the background.
    let printer = {
        let mut notifications = manager.notifications();
        tokio::spawn(async move {
            while let Some((id, n)) = notifications.next().await {
                println!("[notification] {id}: step {n}");
            }
        })
    };

    // 3. Submit three jobs, each reporting three steps of progress.
    for id in ["alpha", "beta", "gamma"] {
        let job: JobRef<String, u64, u64> = JobFn::arc(id.to_string(), || {
            stream::iter((1..=3).map(|n| Ok(JobItem::Notification(n))))
        });
        let accepted = manager.submit(job).await;
        println!("[submit] {id}: accepted={accepted}");
    }

    // 4. Wait for all three completions on the events stream.
    let mut events = manager.events();
    for _ in 0..3 {
        let event = events
            .next()
            .await
            .ok_or_else(|| anyhow::anyhow!("events stream ended early"))?;
        println!(
            "[event] {}: {:?} after {:?}",
            event.id, event.kind, event.duration
        );
    }

    // 5. Shut down; the notification stream terminates and the printer exits.
    manager.shutdown();
    printer.await?;

    println!("\n=== example completed successfully ===");
    Ok(())
}

//! # Example: tap_outputs
//!
//! Demonstrates the tap path: the job runs inline as its output stream is
//! consumed, while notifications still route to the shared stream.
//!
//! ## Run
//! ```bash
//! cargo run --example tap_outputs
//! ```

use futures::{stream, StreamExt};
use jobmux::{JobFn, JobItem, JobManager, JobRef, ManagerConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    println!("=== tap_outputs example ===\n");

    let manager = JobManager::<String, u64, String>::new(ManagerConfig::default());

    // A job mixing progress notifications with real outputs.
    let job: JobRef<String, u64, String> = JobFn::arc("exporter".to_string(), || {
        stream::iter(vec![
            Ok(JobItem::Notification(1)),
            Ok(JobItem::Output("chunk-1".to_string())),
            Ok(JobItem::Notification(2)),
            Ok(JobItem::Output("chunk-2".to_string())),
        ])
    });

    // Outputs flow to this consumer; nothing runs until polled.
    let mut outputs = manager.tap(job);
    while let Some(output) = outputs.next().await {
        println!("[output] {}", output?);
    }

    // Notifications went to the shared stream instead.
    let queued = manager
        .last_notifications(8)
        .ok_or_else(|| anyhow::anyhow!("notifications queue closed"))?;
    println!("[notifications] {queued:?}");

    // Completion is reported on the events stream like any submitted job.
    let events = manager
        .last_events(8)
        .ok_or_else(|| anyhow::anyhow!("events ring closed"))?;
    for event in events {
        println!("[event] {}: {:?} after {:?}", event.id, event.kind, event.duration);
    }

    manager.shutdown();
    println!("\n=== example completed successfully ===");
    Ok(())
}

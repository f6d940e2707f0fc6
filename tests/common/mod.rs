//! Shared fixtures for the integration suite.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use futures::stream;
use jobmux::{JobError, JobFn, JobItem, JobRef};
use tokio::sync::Notify;

pub type Id = String;

/// Job producing the given notifications in order, then completing.
pub fn notifier(id: &str, payloads: Vec<u64>) -> JobRef<Id, u64, u64> {
    JobFn::arc(id.to_string(), move || {
        stream::iter(
            payloads
                .clone()
                .into_iter()
                .map(|n| Ok(JobItem::Notification(n))),
        )
    })
}

/// Job notifying forever, pausing briefly between items.
pub fn ticker(id: &str) -> JobRef<Id, u64, u64> {
    JobFn::arc(id.to_string(), || {
        stream::unfold(0u64, |n| async move {
            tokio::time::sleep(Duration::from_millis(2)).await;
            Some((Ok(JobItem::Notification(n)), n + 1))
        })
    })
}

/// Job that parks until `gate` is released, then emits one notification and
/// completes.
pub fn gated(id: &str, gate: Arc<Notify>) -> JobRef<Id, u64, u64> {
    JobFn::arc(id.to_string(), move || {
        let gate = Arc::clone(&gate);
        stream::once(async move {
            gate.notified().await;
            Ok(JobItem::Notification(0))
        })
    })
}

/// Job emitting one notification, then failing with `reason`.
pub fn faulty(id: &str, reason: &str) -> JobRef<Id, u64, u64> {
    let reason = reason.to_string();
    JobFn::arc(id.to_string(), move || {
        stream::iter(vec![
            Ok(JobItem::Notification(1)),
            Err(JobError::failed(reason.clone())),
        ])
    })
}

/// Polls `probe` every few milliseconds until it holds or a second passes.
pub async fn wait_until(probe: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if probe() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    probe()
}

//! # jobmux
//!
//! **Jobmux** is a lightweight job coordination library for parallel,
//! asynchronous work.
//!
//! A client submits identified jobs; the manager dispatches them
//! concurrently under a configurable cap, merges per-job progress
//! notifications into one shared stream, emits lifecycle events on
//! completion and failure, and supports deterministic external cancellation
//! by job id.
//!
//! ## Features
//!
//! | Area              | Description                                                          | Key types / traits                  |
//! |-------------------|----------------------------------------------------------------------|-------------------------------------|
//! | **Submission**    | Accept jobs under a bounded dispatch queue; id collisions rejected.  | [`JobManager::submit`]              |
//! | **Tapping**       | Run a job inline and consume its outputs as a stream.                | [`JobManager::tap`]                 |
//! | **Cancellation**  | Cancel by id at any lifecycle point; silent, idempotent.             | [`JobManager::cancel`]              |
//! | **Streams**       | Shared notification and event streams, terminating at shutdown.      | [`JobManager::notifications`], [`JobManager::events`] |
//! | **Introspection** | Status and id queries, best-effort queue drains.                     | [`JobManager::status`], [`JobManager::last_events`] |
//! | **Jobs**          | Define jobs as stream-producing values or closures.                  | [`Job`], [`JobFn`], [`JobRef`]      |
//! | **Errors**        | Typed errors for job failure and tap collisions.                     | [`JobError`]                        |
//! | **Configuration** | Centralize queue capacities and concurrency.                         | [`ManagerConfig`]                   |
//!
//! ```no_run
//! use futures::{stream, StreamExt};
//! use jobmux::{JobFn, JobItem, JobManager, JobRef, ManagerConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let manager = JobManager::<String, u64, ()>::new(ManagerConfig::default());
//!
//!     // A job is an id plus a lazy stream of notifications and outputs.
//!     let job: JobRef<String, u64, ()> = JobFn::arc("ingest".to_string(), || {
//!         stream::iter((1..=3).map(|n| Ok(JobItem::Notification(n))))
//!     });
//!
//!     assert!(manager.submit(job).await);
//!
//!     let mut notifications = manager.notifications();
//!     while let Some((id, n)) = notifications.next().await {
//!         println!("{id}: {n}");
//!         if n == 3 {
//!             break;
//!         }
//!     }
//!
//!     manager.shutdown();
//! }
//! ```
//!
//! ---

mod clock;
mod config;
mod core;
mod error;
mod events;
mod jobs;
mod queue;

// ---- Public re-exports ----

pub use clock::{Clock, ClockRef, EpochMillis, SystemClock};
pub use config::ManagerConfig;
pub use crate::core::{EventStream, JobManager, NotificationStream, OutputStream};
pub use error::JobError;
pub use events::{JobEvent, JobEventKind};
pub use jobs::{BoxJobStream, Job, JobFn, JobId, JobItem, JobRef, JobStatus};

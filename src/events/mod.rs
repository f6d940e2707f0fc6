//! Lifecycle events: data model for the shared events stream.
//!
//! This module groups the event **data model** emitted by job runners when a
//! job terminates. Events travel through the manager's bounded events ring
//! and surface on [`JobManager::events`](crate::JobManager::events) and
//! [`JobManager::last_events`](crate::JobManager::last_events).
//!
//! ## Contents
//! - [`JobEventKind`], [`JobEvent`] - event classification and payload
//!
//! Externally-cancelled jobs emit **no** event; clients observe cancellation
//! through `status` returning `None` and the id leaving `job_ids`.

mod event;

pub use event::{JobEvent, JobEventKind};

//! # Function-backed job (`JobFn`)
//!
//! [`JobFn`] wraps an id together with a closure `F: Fn() -> S` producing a
//! fresh item stream per call. This avoids shared mutable state between the
//! submit-time and run-time views of a job.
//!
//! ## Concurrency semantics
//! - Each call to [`Job::stream`] builds a **new** stream owning its state.
//! - If shared state is needed, move an explicit `Arc<...>` into the closure.
//!
//! ## Example
//! ```rust
//! use futures::stream;
//! use jobmux::{JobFn, JobItem, JobRef};
//!
//! let job: JobRef<String, u32, ()> = JobFn::arc("worker".to_string(), || {
//!     stream::iter(vec![
//!         Ok(JobItem::Notification(1)),
//!         Ok(JobItem::Notification(2)),
//!     ])
//! });
//!
//! assert_eq!(job.id(), "worker");
//! ```

use std::sync::Arc;

use futures::Stream;

use crate::error::JobError;
use crate::jobs::job::{BoxJobStream, Job, JobId, JobItem};

/// Function-backed job implementation.
///
/// Wraps a closure that *creates* a new item stream per call.
#[derive(Debug)]
pub struct JobFn<I, F> {
    id: I,
    f: F,
}

impl<I, F> JobFn<I, F> {
    /// Creates a new function-backed job.
    ///
    /// Prefer [`JobFn::arc`] when you immediately need a [`JobRef`](crate::JobRef).
    pub fn new(id: I, f: F) -> Self {
        Self { id, f }
    }

    /// Creates the job and returns it as a shared handle (`Arc<Self>`).
    pub fn arc(id: I, f: F) -> Arc<Self> {
        Arc::new(Self::new(id, f))
    }
}

impl<I, F, S, N, R> Job for JobFn<I, F>
where
    I: JobId,
    F: Fn() -> S + Send + Sync + 'static, // Fn, not FnMut
    S: Stream<Item = Result<JobItem<N, R>, JobError>> + Send + 'static,
    N: Send + 'static,
    R: Send + 'static,
{
    type Id = I;
    type Notice = N;
    type Output = R;

    fn id(&self) -> I {
        self.id.clone()
    }

    fn stream(&self) -> BoxJobStream<N, R> {
        Box::pin((self.f)())
    }
}

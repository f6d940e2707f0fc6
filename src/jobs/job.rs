//! # Job abstraction for managed execution.
//!
//! Defines the core [`Job`] trait for identified, stream-producing units of
//! work.
//!
//! - **[`Job`]** - trait for implementing jobs whose body is a lazy item stream
//! - **[`JobRef`]** - shared handle (`Arc<dyn Job>`) for passing jobs across the runtime
//! - **[`JobItem`]** - sum type yielded by a job's stream
//! - **[`BoxJobStream`]** - type alias for boxed job item streams
//!
//! ## Rules
//! - The crate provides [`JobFn`](crate::JobFn), a function-backed
//!   implementation that wraps stream-building closures as jobs.
//! - A job's stream may be finite or infinite; the manager drives it until it
//!   ends, yields an error, or the job is cancelled. Cancellation takes effect
//!   at the next suspension point, so streams should suspend between items.

use std::fmt::Display;
use std::hash::Hash;
use std::{pin::Pin, sync::Arc};

use futures::Stream;

use crate::error::JobError;

/// Blanket bound for job id types.
///
/// Ids key the registry (`Clone + Eq + Hash`), cross task boundaries
/// (`Send + Sync + 'static`), and render in logs and collision errors
/// (`Display`). Implemented automatically for every qualifying type.
pub trait JobId: Clone + Eq + Hash + Display + Send + Sync + 'static {}

impl<T> JobId for T where T: Clone + Eq + Hash + Display + Send + Sync + 'static {}

/// One element produced by a job's body.
///
/// Submitted jobs communicate through `Notification`s by convention; any
/// `Output` they yield is discarded. Tapped jobs route `Notification`s to the
/// shared notifications stream and `Output`s to the tap consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobItem<N, R> {
    /// Progress payload routed to the shared notifications stream as `(id, N)`.
    Notification(N),
    /// Result payload delivered to the tap consumer (discarded on the submit path).
    Output(R),
}

/// Boxed stream returned by [`Job::stream`].
///
/// - **Boxed**: required for trait objects (dynamic dispatch)
/// - **Pinned**: required for async streams
/// - **Send**: job streams are driven from runner tasks
pub type BoxJobStream<N, R> =
    Pin<Box<dyn Stream<Item = Result<JobItem<N, R>, JobError>> + Send + 'static>>;

/// Shared handle to a job object.
///
/// Type alias for `Arc<dyn Job>`, used throughout the runtime for passing
/// jobs to [`JobManager`](crate::JobManager) and cloning references cheaply.
pub type JobRef<I, N, R> = Arc<dyn Job<Id = I, Notice = N, Output = R>>;

/// Identified, stream-producing unit of work.
///
/// A `Job` couples a stable id with a producer of a lazy item stream. The id
/// keys the manager's registry: at most one job per id is in flight, and the
/// id becomes reusable once the job terminates.
///
/// ## Rules
///
/// - **Stateless streaming**: `stream(&self)` is `Fn`, not `FnMut`; each
///   call creates a **new**, independent stream.
/// - **Opaque payloads**: the manager never inspects `Notice` or `Output`
///   values; it only routes them.
///
/// ## Example
///
/// ```rust
/// use futures::stream;
/// use jobmux::{BoxJobStream, Job, JobItem};
///
/// struct Countdown;
///
/// impl Job for Countdown {
///     type Id = String;
///     type Notice = u32;
///     type Output = ();
///
///     fn id(&self) -> String {
///         "countdown".to_string()
///     }
///
///     fn stream(&self) -> BoxJobStream<u32, ()> {
///         Box::pin(stream::iter(
///             (0..3).rev().map(|n| Ok(JobItem::Notification(n))),
///         ))
///     }
/// }
/// ```
pub trait Job: Send + Sync + 'static {
    /// Registry key type.
    type Id: JobId;
    /// Notification payload type.
    type Notice;
    /// Output payload type (delivered only through `tap`).
    type Output;

    /// Returns the job's id.
    ///
    /// Must be stable across calls; the manager captures it once at
    /// submission and keys every registry operation on it.
    fn id(&self) -> Self::Id;

    /// Creates a new stream producing the job's items.
    ///
    /// ### Laziness
    /// Nothing runs until the manager (or tap consumer) polls the stream.
    ///
    /// ### Stateless execution
    /// This method takes `&self`, so each call returns an independent stream
    /// with no shared mutable state between them.
    fn stream(&self) -> BoxJobStream<Self::Notice, Self::Output>;
}

//! # JobManager: public facade over registry, queues, and dispatcher.
//!
//! The manager owns the runtime pieces (registry, notifications queue,
//! events ring, dispatch channel) and wires submissions through the runner
//! state machine.
//!
//! - Accept jobs (`submit`) and dispatch them under the concurrency cap
//! - Run jobs inline on the consumer (`tap`) with outputs surfaced
//! - Cancel jobs by id, deterministically, at any lifecycle point
//! - Aggregate per-job notifications into one shared stream
//! - Emit completion/failure events on a never-blocking ring
//! - Answer status/id queries and best-effort queue drains
//! - Shut down without waiting on producers or consumers
//!
//! ## Architecture
//! ```text
//! submit(job) ──► registry: insert Pending ──► dispatch queue (bounded)
//!                                                    │
//!                                 Dispatcher (≤ job_concurrency)
//!                                                    │
//!                                    Runner state machine (per job)
//!                                      ├──► notifications queue ──► notifications()
//!                                      └──► events ring ──────────► events()
//!
//! tap(job)   ──► Runner driven inline by the returned stream
//! cancel(id) ──► Running: raise token │ Pending: CAS to Canceled
//! ```
//!
//! ## Rules
//! - Between a `true` return from `submit` and the job's terminal event, the
//!   id stays visible as `Pending` or `Running`.
//! - Exactly one `Completed`/`Failed` event per job reaching either outcome;
//!   cancellation is silent.
//! - Shutdown never blocks: queues close by token, the registry is cleared,
//!   in-flight runners finish on their own.
//! - Dropping the last handle shuts the manager down (scoped acquisition).

use std::{marker::PhantomData, pin::Pin, sync::Arc};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::clock::{ClockRef, SystemClock};
use crate::config::ManagerConfig;
use crate::core::dispatcher::{BoxRunFuture, Dispatcher};
use crate::core::registry::{JobSlot, Registry};
use crate::core::runner::Runner;
use crate::error::JobError;
use crate::events::JobEvent;
use crate::jobs::{JobId, JobRef, JobStatus};
use crate::queue::{BoundedQueue, RingQueue};

/// Shared stream of `(id, payload)` notification pairs.
pub type NotificationStream<I, N> = Pin<Box<dyn Stream<Item = (I, N)> + Send + 'static>>;

/// Shared stream of terminal lifecycle events.
pub type EventStream<I> = Pin<Box<dyn Stream<Item = JobEvent<I>> + Send + 'static>>;

/// Result stream returned by [`JobManager::tap`].
pub type OutputStream<R> = Pin<Box<dyn Stream<Item = Result<R, JobError>> + Send + 'static>>;

/// Coordinates identified jobs: bounded dispatch, shared notification and
/// event streams, cancellation by id.
///
/// Generic over the id type `I`, the notification payload `N`, and the
/// output payload `R`, all opaque to the manager.
///
/// ```rust
/// use futures::{stream, StreamExt};
/// use jobmux::{JobFn, JobItem, JobManager, JobRef, ManagerConfig};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let manager = JobManager::<String, u32, ()>::new(ManagerConfig::default());
///
///     let job: JobRef<String, u32, ()> = JobFn::arc("greeter".to_string(), || {
///         stream::iter(vec![Ok(JobItem::Notification(1))])
///     });
///     assert!(manager.submit(job).await);
///
///     let (id, payload) = manager.notifications().next().await.unwrap();
///     assert_eq!((id.as_str(), payload), ("greeter", 1));
///
///     manager.shutdown();
/// }
/// ```
pub struct JobManager<I: JobId, N, R> {
    /// Timestamp source for event timing.
    clock: ClockRef,
    /// The id-keyed job registry; the only shared mutable state.
    registry: Arc<Registry<I>>,
    /// Shared notifications queue (bounded, backpressuring).
    notifications: BoundedQueue<(I, N)>,
    /// Events ring (bounded, oldest-dropping).
    events: RingQueue<JobEvent<I>>,
    /// Producer side of the dispatch queue.
    dispatch: mpsc::Sender<BoxRunFuture>,
    /// Runtime shutdown signal; stops the dispatcher pulling new work.
    shutdown: CancellationToken,
    /// Marker for the output payload type, not stored in any field.
    _output: PhantomData<fn() -> R>,
}

impl<I, N, R> JobManager<I, N, R>
where
    I: JobId,
    N: Send + 'static,
    R: Send + 'static,
{
    /// Creates a manager with the system wall clock.
    pub fn new(cfg: ManagerConfig) -> Arc<Self> {
        Self::with_clock(cfg, Arc::new(SystemClock))
    }

    /// Creates a manager with an injected clock source.
    pub fn with_clock(cfg: ManagerConfig, clock: ClockRef) -> Arc<Self> {
        let (dispatch, work) = mpsc::channel::<BoxRunFuture>(cfg.job_limit_clamped());
        let shutdown = CancellationToken::new();
        // detached: shutdown never joins it, in-flight runners drain on their own
        let _ = Dispatcher::spawn(work, cfg.job_concurrency_clamped(), shutdown.clone());

        Arc::new(Self {
            clock,
            registry: Arc::new(Registry::new()),
            notifications: BoundedQueue::new(cfg.notifications_limit_clamped()),
            events: RingQueue::new(cfg.events_limit_clamped()),
            dispatch,
            shutdown,
            _output: PhantomData,
        })
    }

    /// Submits a job for dispatched execution.
    ///
    /// Returns `true` once the job is accepted and enqueued; `false` on an
    /// id collision (no side effects) or after shutdown.
    ///
    /// The job is visible as `Pending` from the moment of acceptance, before
    /// any suspension: when the dispatch queue is saturated this call parks,
    /// but `status` and `job_ids` already report the job.
    pub async fn submit(&self, job: JobRef<I, N, R>) -> bool {
        if self.shutdown.is_cancelled() {
            return false;
        }
        let id = job.id();
        let pending = JobSlot::pending();
        if !self.registry.insert_if_absent(id.clone(), pending.clone()) {
            tracing::debug!(job = %id, "submit rejected: id already in flight");
            return false;
        }
        let started_at = self.clock.now_millis();
        let runner = self.runner(job, Some(started_at));

        if self.dispatch.send(Box::pin(runner.run())).await.is_err() {
            // shut down between acceptance and enqueue; undo the insert
            self.registry.remove_if_equal(&id, &pending);
            tracing::debug!(job = %id, "submit rejected: manager shut down");
            return false;
        }
        tracing::debug!(job = %id, "job accepted");
        true
    }

    /// Runs a job inline on the consumer, returning its output stream.
    ///
    /// Notifications still route to the shared notifications stream; only
    /// `Output` items flow to the caller. Nothing executes until the stream
    /// is polled. If the id is already running, the stream yields exactly
    /// one `Err(JobError::AlreadyRunning)` on first poll and terminates.
    pub fn tap(&self, job: JobRef<I, N, R>) -> OutputStream<R> {
        if self.shutdown.is_cancelled() {
            return Box::pin(futures::stream::empty());
        }
        Box::pin(self.runner(job, None).into_tap_stream())
    }

    /// Requests cancellation of a job by id. Asynchronous and idempotent:
    /// returns immediately; teardown happens at the job's next suspension
    /// point. Unknown or already-terminated ids are a silent no-op.
    ///
    /// No event is emitted for a cancelled job; observe the cancellation
    /// through `status(id)` turning `None`.
    pub fn cancel(&self, id: &I) {
        loop {
            let Some(slot) = self.registry.get(id) else {
                return;
            };
            match slot.status() {
                JobStatus::Running => {
                    tracing::debug!(job = %id, "cancel: signaling running job");
                    slot.raise_cancel();
                    return;
                }
                JobStatus::Pending => {
                    if self.registry.replace_if_equal(id, &slot, JobSlot::canceled()) {
                        tracing::debug!(job = %id, "cancel: pending job marked canceled");
                        return;
                    }
                    // lost to the front transition; re-examine, it is Running now
                }
                JobStatus::Canceled => return,
            }
        }
    }

    /// Returns the job's lifecycle status, or `None` if the id is not in
    /// flight (never submitted, terminated, or cancellation cleanup done).
    pub fn status(&self, id: &I) -> Option<JobStatus> {
        self.registry.get(id).map(|slot| slot.status())
    }

    /// Snapshot of the ids currently in flight, in no particular order.
    pub fn job_ids(&self) -> Vec<I> {
        self.registry.keys()
    }

    /// Drains up to `max` queued notifications without consuming the stream.
    ///
    /// `None` when the queue is closed or momentarily unavailable (a stream
    /// consumer holds it); `Some(vec![])` when merely empty. Introspection
    /// only, not a substitute for consuming [`notifications`](Self::notifications).
    pub fn last_notifications(&self, max: usize) -> Option<Vec<(I, N)>> {
        self.notifications.drain_up_to(max)
    }

    /// Drains up to `max` queued events. Same contract as
    /// [`last_notifications`](Self::last_notifications).
    pub fn last_events(&self, max: usize) -> Option<Vec<JobEvent<I>>> {
        self.events.drain_up_to(max)
    }

    /// The shared notifications stream: `(id, payload)` pairs from every
    /// running job, per-job order preserved, terminating at shutdown.
    pub fn notifications(&self) -> NotificationStream<I, N> {
        Box::pin(self.notifications.stream())
    }

    /// The shared events stream: one terminal event per completed or failed
    /// job, terminating at shutdown.
    pub fn events(&self) -> EventStream<I> {
        Box::pin(self.events.stream())
    }

    fn runner(&self, job: JobRef<I, N, R>, started_at: Option<u64>) -> Runner<I, N, R> {
        Runner::new(
            job,
            Arc::clone(&self.registry),
            self.notifications.clone(),
            self.events.clone(),
            Arc::clone(&self.clock),
            started_at,
        )
    }
}

impl<I: JobId, N, R> JobManager<I, N, R> {
    /// Shuts the manager down. Synchronous, idempotent, never blocks:
    /// - the dispatcher stops pulling queued runners,
    /// - notifications/events streams terminate once drained,
    /// - blocked producers and `submit` callers wake immediately,
    /// - the registry is cleared.
    ///
    /// In-flight runners keep executing until they complete or touch a
    /// closed queue. Dropping the last manager handle calls this too, so
    /// disposal runs shutdown on every exit path.
    pub fn shutdown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        tracing::debug!("job manager shutting down");
        self.shutdown.cancel();
        self.notifications.close();
        self.events.close();
        self.registry.clear();
    }
}

impl<I: JobId, N, R> Drop for JobManager<I, N, R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

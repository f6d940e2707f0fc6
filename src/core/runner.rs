//! # Runner: drives one job through its lifecycle state machine.
//!
//! Both entry points build the same [`Runner`]; they differ only in how the
//! body is driven and where `Output` items go:
//! - **submit**: the boxed [`Runner::run`] future goes through the dispatch
//!   queue; outputs are discarded (submitted jobs communicate through
//!   notifications by convention).
//! - **tap**: [`Runner::into_tap_stream`] is driven inline by the consumer;
//!   outputs are yielded to it.
//!
//! ## State machine
//! ```text
//! front transition (CAS loop):
//!   Pending  ──replace_if_equal──► Running(cancel)   proceed to body
//!   Canceled ──remove_if_equal───► (entry gone)      skip body, no event
//!   Running  ─────────────────────► collision         "already running"
//!   absent   ──tap: insert_if_absent Running──►       proceed to body
//!   absent   ──submit──────────────► skip body        (a prior cancel cleaned up)
//!
//! body (interruptible at every suspension point):
//!   Notification(n) ──► notifications queue (may park: backpressure)
//!   Output(r)       ──► tap consumer / discarded
//!
//! termination (exactly once, via ActiveRun):
//!   stream ends   ──► remove_if_equal ──► Completed event
//!   stream errors ──► remove_if_equal ──► Failed event
//!   cancel raised ──► remove_if_equal ──► no event
//!   queue closed  ──► remove_if_equal ──► no event (shutdown)
//! ```
//!
//! ## Rules
//! - Cleanup is **conditional** on the exact Running context this runner
//!   installed, so a resubmission racing the teardown is never clobbered.
//! - The event is enqueued strictly after the registry entry is removed and
//!   after every notification of the job; the events ring never blocks, so
//!   teardown cannot stall.
//! - [`ActiveRun`] removes the entry from `Drop` if no terminal path ran:
//!   an abandoned tap stream behaves like a cancellation.

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::clock::{ClockRef, EpochMillis};
use crate::core::registry::{JobSlot, Registry};
use crate::error::JobError;
use crate::events::JobEvent;
use crate::jobs::{BoxJobStream, JobId, JobItem, JobRef, JobStatus};
use crate::queue::{BoundedQueue, QueueClosed, RingQueue};

/// Decision taken by the front transition.
enum Front {
    /// Running context installed; execute the body.
    Start,
    /// Nothing to do: cancelled before start, or the entry is gone.
    Skip,
    /// Another runner holds the id (tap path).
    Collision,
}

/// Why the body stopped.
enum Exit {
    /// Item stream exhausted normally.
    Completed,
    /// Item stream yielded an error.
    Failed(String),
    /// Cancellation signal raised.
    Canceled,
    /// Notifications queue closed mid-body (manager shutdown).
    Closed,
}

/// One step of the driven body.
enum Step<R> {
    /// An `Output` item surfaced (tap yields it, submit drops it).
    Output(R),
    /// The body is done; settle with the given exit.
    Stop(Exit),
}

pub(crate) struct Runner<I: JobId, N, R> {
    job: JobRef<I, N, R>,
    id: I,
    registry: Arc<Registry<I>>,
    notifications: BoundedQueue<(I, N)>,
    events: RingQueue<JobEvent<I>>,
    clock: ClockRef,
    /// Stamped at acceptance by `submit`; `tap` stamps at stream start.
    started_at: Option<EpochMillis>,
    cancel: CancellationToken,
    /// The Running context this runner installs; cleanup is conditional on it.
    running: JobSlot,
}

impl<I, N, R> Runner<I, N, R>
where
    I: JobId,
    N: Send + 'static,
    R: Send + 'static,
{
    pub(crate) fn new(
        job: JobRef<I, N, R>,
        registry: Arc<Registry<I>>,
        notifications: BoundedQueue<(I, N)>,
        events: RingQueue<JobEvent<I>>,
        clock: ClockRef,
        started_at: Option<EpochMillis>,
    ) -> Self {
        let id = job.id();
        let cancel = CancellationToken::new();
        let running = JobSlot::running(cancel.clone());
        Self {
            job,
            id,
            registry,
            notifications,
            events,
            clock,
            started_at,
            cancel,
            running,
        }
    }

    /// Drives a submitted job to termination.
    pub(crate) async fn run(self) {
        let active = match self.begin(false) {
            Front::Start => self.activate(),
            Front::Skip => return,
            Front::Collision => {
                // unreachable on the submit path: only this runner's own
                // submission can have created the entry
                tracing::warn!(job = %self.id, "submit runner found a foreign running context");
                return;
            }
        };

        let mut items = self.job.stream();
        loop {
            match self.next_step(&mut items).await {
                Step::Output(_) => continue,
                Step::Stop(exit) => {
                    active.settle(exit);
                    return;
                }
            }
        }
    }

    /// Converts the runner into the tap result stream.
    ///
    /// The state machine executes inline as the consumer polls: the front
    /// transition on first poll, the body between polls. A collision is
    /// reported deterministically as the stream's first and only item.
    pub(crate) fn into_tap_stream(self) -> impl Stream<Item = Result<R, JobError>> + Send {
        async_stream::stream! {
            let active = match self.begin(true) {
                Front::Start => self.activate(),
                Front::Skip => return,
                Front::Collision => {
                    yield Err(JobError::AlreadyRunning { id: self.id.to_string() });
                    return;
                }
            };

            let mut items = self.job.stream();
            loop {
                match self.next_step(&mut items).await {
                    Step::Output(output) => yield Ok(output),
                    Step::Stop(exit) => {
                        active.settle(exit);
                        return;
                    }
                }
            }
        }
    }

    /// Front transition: claim the id, retrying on CAS races.
    fn begin(&self, ignore_absence: bool) -> Front {
        loop {
            match self.registry.get(&self.id) {
                Some(slot) => match slot.status() {
                    JobStatus::Pending => {
                        if self
                            .registry
                            .replace_if_equal(&self.id, &slot, self.running.clone())
                        {
                            return Front::Start;
                        }
                        // lost to a concurrent cancel; re-examine
                    }
                    JobStatus::Canceled => {
                        self.registry.remove_if_equal(&self.id, &slot);
                        tracing::debug!(job = %self.id, "job canceled before start");
                        return Front::Skip;
                    }
                    JobStatus::Running => return Front::Collision,
                },
                None if ignore_absence => {
                    if self
                        .registry
                        .insert_if_absent(self.id.clone(), self.running.clone())
                    {
                        return Front::Start;
                    }
                }
                None => return Front::Skip,
            }
        }
    }

    /// Builds the teardown guard once the front transition succeeded.
    fn activate(&self) -> ActiveRun<I> {
        let started_at = self
            .started_at
            .unwrap_or_else(|| self.clock.now_millis());
        tracing::debug!(job = %self.id, "job running");
        ActiveRun {
            registry: Arc::clone(&self.registry),
            events: self.events.clone(),
            clock: Arc::clone(&self.clock),
            id: self.id.clone(),
            running: self.running.clone(),
            started_at,
            settled: false,
        }
    }

    /// Pulls items until an output surfaces or the body terminates.
    ///
    /// Every branch suspends on the cancellation signal, so an external
    /// cancel takes effect at the next item or the next queue wait.
    async fn next_step(&self, items: &mut BoxJobStream<N, R>) -> Step<R> {
        loop {
            if self.cancel.is_cancelled() {
                return Step::Stop(Exit::Canceled);
            }
            let item = tokio::select! {
                _ = self.cancel.cancelled() => return Step::Stop(Exit::Canceled),
                item = items.next() => item,
            };
            match item {
                None => return Step::Stop(Exit::Completed),
                Some(Err(error)) => return Step::Stop(Exit::Failed(error.to_string())),
                Some(Ok(JobItem::Output(output))) => return Step::Output(output),
                Some(Ok(JobItem::Notification(payload))) => {
                    let push = self.notifications.push((self.id.clone(), payload));
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Step::Stop(Exit::Canceled),
                        pushed = push => {
                            if let Err(QueueClosed) = pushed {
                                return Step::Stop(Exit::Closed);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Teardown guard for a body that passed its front transition.
///
/// Exactly one of the terminal paths runs; if the driving future or stream
/// is dropped before any of them, `Drop` removes the registry entry
/// conditionally with no event, the same observable outcome as cancellation.
struct ActiveRun<I: JobId> {
    registry: Arc<Registry<I>>,
    events: RingQueue<JobEvent<I>>,
    clock: ClockRef,
    id: I,
    running: JobSlot,
    started_at: EpochMillis,
    settled: bool,
}

impl<I: JobId> ActiveRun<I> {
    /// Performs the terminal cleanup for `exit`: conditional removal first,
    /// then the event (if the exit emits one).
    fn settle(mut self, exit: Exit) {
        self.settled = true;
        self.registry.remove_if_equal(&self.id, &self.running);
        match exit {
            Exit::Completed => {
                let duration = self.elapsed();
                tracing::debug!(job = %self.id, duration_ms = duration.as_millis() as u64, "job completed");
                self.events
                    .push(JobEvent::completed(self.id.clone(), self.started_at, duration));
            }
            Exit::Failed(reason) => {
                let duration = self.elapsed();
                tracing::debug!(job = %self.id, error = %reason, "job failed");
                self.events.push(JobEvent::failed(
                    self.id.clone(),
                    self.started_at,
                    duration,
                    reason,
                ));
            }
            Exit::Canceled => {
                tracing::debug!(job = %self.id, "job canceled");
            }
            Exit::Closed => {
                tracing::debug!(job = %self.id, "job wound down at shutdown");
            }
        }
    }

    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.clock.now_millis().saturating_sub(self.started_at))
    }
}

impl<I: JobId> Drop for ActiveRun<I> {
    fn drop(&mut self) {
        if !self.settled {
            self.registry.remove_if_equal(&self.id, &self.running);
            tracing::debug!(job = %self.id, "job abandoned mid-run");
        }
    }
}

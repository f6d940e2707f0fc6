//! Runtime core: coordination and lifecycle.
//!
//! This module contains the embedded implementation of the jobmux runtime.
//! The public API re-exported from here is [`JobManager`] and its stream
//! aliases. Everything else is an internal building block the manager wires
//! together.
//!
//! ## Files & responsibilities
//! - **manager.rs**: public facade; owns the registry, the notifications
//!   queue, the events ring and the dispatch channel; implements submit /
//!   tap / cancel / status / drains / shutdown.
//! - **registry.rs**: atomic id → context map; insert-if-absent, CAS
//!   replace, conditional remove. The only shared mutable state.
//! - **runner.rs**: per-job lifecycle state machine; front transition,
//!   interruptible body, exactly-once teardown.
//! - **dispatcher.rs**: pulls boxed runners off the dispatch queue and runs
//!   up to the concurrency cap in parallel.
//!
//! ## Wiring (module-level flow)
//! ```text
//! Application code
//!   └─ builds JobRef, creates JobManager, calls submit/tap/cancel
//!
//! submit(job)
//!   ├─ registry.insert_if_absent(id, Pending)    false → submit returns false
//!   ├─ dispatch.send(runner)                     parks when job_limit reached
//!   └─ return true
//!
//! Dispatcher (≤ job_concurrency in parallel)
//!   └─ Runner per job
//!        ├─ front transition: Pending→Running CAS (or skip / collision)
//!        ├─ body: Notification(n) → notifications queue (backpressure)
//!        │        Output(r)       → tap consumer, discarded for submit
//!        └─ teardown: remove_if_equal + Completed/Failed event, or silent
//!
//! cancel(id)
//!   ├─ Running  → raise the job's cancellation token
//!   ├─ Pending  → CAS to Canceled (retry against the front transition)
//!   └─ other    → no-op
//!
//! shutdown()
//!   ├─ cancel runtime token      → dispatcher stops pulling
//!   ├─ close queues              → streams terminate after draining
//!   └─ clear registry
//! ```
//!
//! Internal modules:
//! - [`dispatcher`] bounded-concurrency execution of runner futures
//! - [`manager`]    facade; owns queues/registry; shutdown
//! - [`registry`]   atomic id → slot map with per-key CAS
//! - [`runner`]     one job's lifecycle from front transition to teardown

mod dispatcher;
mod manager;
mod registry;
mod runner;

pub use manager::{EventStream, JobManager, NotificationStream, OutputStream};

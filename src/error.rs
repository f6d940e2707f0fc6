//! # Error types used by the job manager and job streams.
//!
//! A single enum, [`JobError`], covers both sides of the boundary:
//!
//! - jobs report body failures by yielding `Err(JobError::Failed { .. })`
//!   from their item stream; the runner converts that into a `Failed`
//!   lifecycle event and never re-raises it to the dispatcher.
//! - the manager reports a tap collision by terminating the tap stream with
//!   `JobError::AlreadyRunning`.
//!
//! The type provides `as_label()` for stable snake_case log labels.

use thiserror::Error;

/// # Errors produced by job execution and the tap path.
///
/// Duplicate submission is not an error: `submit` reports an id collision
/// through its `bool` return and has no side effects in that case.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Job body failed while producing its item stream.
    ///
    /// The runner catches this, emits a `Failed` event carrying `reason`,
    /// and removes the job from the registry.
    #[error("job execution failed: {reason}")]
    Failed {
        /// Human-readable failure description, carried into the event.
        reason: String,
    },

    /// A tap stream collided with an id that is already running.
    ///
    /// Reported deterministically as the first (and only) item of the
    /// returned stream; the job body never starts.
    #[error("job '{id}' is already running")]
    AlreadyRunning {
        /// The colliding job id, rendered for display.
        id: String,
    },
}

impl JobError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            JobError::Failed { .. } => "job_failed",
            JobError::AlreadyRunning { .. } => "job_already_running",
        }
    }

    /// Convenience constructor for body failures.
    pub fn failed(reason: impl Into<String>) -> Self {
        JobError::Failed {
            reason: reason.into(),
        }
    }
}

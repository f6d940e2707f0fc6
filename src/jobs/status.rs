//! Registry-visible job status.

/// Lifecycle status of a job while it occupies a registry entry.
///
/// `Completed` and `Failed` are event kinds, not statuses: a job reaching
/// either outcome is removed from the registry, so `status(id)` returns
/// `None` for it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Accepted by `submit`, not yet picked up by a runner.
    Pending,
    /// A runner is executing the job body; a cancellation handle is wired.
    Running,
    /// Externally cancelled while still pending; the entry lingers only
    /// until the runner observes it and cleans up.
    Canceled,
}

impl JobStatus {
    /// Returns the status name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

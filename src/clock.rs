//! Clock source consumed by the manager.
//!
//! Event timing (`started_at`, duration) goes through [`Clock`] so tests can
//! inject a deterministic source; production code uses [`SystemClock`].

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Epoch-millis timestamp as produced by a [`Clock`].
pub type EpochMillis = u64;

/// Shared handle to a clock source.
pub type ClockRef = Arc<dyn Clock>;

/// Epoch-millis reader.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current time as milliseconds since the Unix epoch.
    fn now_millis(&self) -> EpochMillis;
}

/// Wall-clock implementation backed by [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> EpochMillis {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now_millis();
        let b = clock.now_millis();
        assert!(b >= a);
        assert!(a > 0);
    }
}

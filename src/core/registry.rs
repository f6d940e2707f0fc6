//! # Job registry - atomic id → context mapping.
//!
//! The registry is the single piece of shared mutable state in the runtime.
//! It maps job ids to their [`JobSlot`] (status + optional cancellation
//! handle) and exposes **atomic primitives only**: insert-if-absent, read,
//! compare-and-replace, compare-and-remove. Callers loop on CAS failure
//! rather than block; the per-shard lock inside [`DashMap`] is held only for
//! the duration of one compare.
//!
//! ## Context identity
//! `CancellationToken` has no meaningful equality, so each slot carries a
//! unique epoch stamp assigned at construction. Two slots compare equal iff
//! they are the *same* installed context, which is exactly what conditional
//! removal needs: a runner tearing down must not clobber a fresh entry that
//! a later submission of the same id installed after this runner's context
//! was already replaced.
//!
//! ## Rules
//! - Only `submit` creates `Pending` slots; only runners install `Running`
//!   slots; only `cancel` installs `Canceled` slots.
//! - Every insert is eventually paired with a matching conditional remove,
//!   so the map is bounded by the set of in-flight jobs.
//! - `clear` is reserved for shutdown.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use dashmap::{mapref::entry::Entry, DashMap};
use tokio_util::sync::CancellationToken;

use crate::jobs::{JobId, JobStatus};

/// Global epoch counter establishing slot identity.
static SLOT_EPOCH: AtomicU64 = AtomicU64::new(0);

/// Per-id registry record: status plus the cancellation handle.
///
/// Invariants, maintained by the constructors:
/// - `Pending` and `Canceled` slots carry no cancellation handle.
/// - `Running` slots always carry one.
#[derive(Clone)]
pub(crate) struct JobSlot {
    status: JobStatus,
    cancel: Option<CancellationToken>,
    epoch: u64,
}

impl JobSlot {
    fn next_epoch() -> u64 {
        SLOT_EPOCH.fetch_add(1, AtomicOrdering::Relaxed)
    }

    /// A freshly accepted submission, not yet picked up by a runner.
    pub(crate) fn pending() -> Self {
        Self {
            status: JobStatus::Pending,
            cancel: None,
            epoch: Self::next_epoch(),
        }
    }

    /// An executing job; `cancel` raises the runner's interrupt signal.
    pub(crate) fn running(cancel: CancellationToken) -> Self {
        Self {
            status: JobStatus::Running,
            cancel: Some(cancel),
            epoch: Self::next_epoch(),
        }
    }

    /// Cancelled while pending; lingers until the runner observes it.
    pub(crate) fn canceled() -> Self {
        Self {
            status: JobStatus::Canceled,
            cancel: None,
            epoch: Self::next_epoch(),
        }
    }

    /// Current lifecycle status.
    pub(crate) fn status(&self) -> JobStatus {
        self.status
    }

    /// Raises the cancellation signal, if this slot carries one.
    pub(crate) fn raise_cancel(&self) {
        if let Some(token) = &self.cancel {
            token.cancel();
        }
    }

    /// True iff `other` is the same installed context.
    #[inline]
    fn same_context(&self, other: &JobSlot) -> bool {
        self.epoch == other.epoch
    }
}

/// Atomic id → [`JobSlot`] mapping.
pub(crate) struct Registry<I: JobId> {
    slots: DashMap<I, JobSlot>,
}

impl<I: JobId> Registry<I> {
    pub(crate) fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Inserts `slot` and returns true iff no entry existed for `id`.
    pub(crate) fn insert_if_absent(&self, id: I, slot: JobSlot) -> bool {
        match self.slots.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
                true
            }
        }
    }

    /// Reads the current slot for `id`.
    pub(crate) fn get(&self, id: &I) -> Option<JobSlot> {
        self.slots.get(id).map(|entry| entry.value().clone())
    }

    /// CAS: installs `next` iff the current slot is still `expected`.
    pub(crate) fn replace_if_equal(&self, id: &I, expected: &JobSlot, next: JobSlot) -> bool {
        match self.slots.get_mut(id) {
            Some(mut entry) if entry.same_context(expected) => {
                *entry = next;
                true
            }
            _ => false,
        }
    }

    /// Removes the entry iff the current slot is still `expected`.
    pub(crate) fn remove_if_equal(&self, id: &I, expected: &JobSlot) -> bool {
        self.slots
            .remove_if(id, |_, slot| slot.same_context(expected))
            .is_some()
    }

    /// Drops every entry. Shutdown only.
    pub(crate) fn clear(&self) {
        self.slots.clear();
    }

    /// Snapshot of the ids currently in flight.
    pub(crate) fn keys(&self) -> Vec<I> {
        self.slots.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of in-flight entries.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_if_absent_rejects_duplicates() {
        let reg: Registry<String> = Registry::new();
        assert!(reg.insert_if_absent("a".into(), JobSlot::pending()));
        assert!(!reg.insert_if_absent("a".into(), JobSlot::pending()));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn replace_if_equal_is_a_cas() {
        let reg: Registry<String> = Registry::new();
        let pending = JobSlot::pending();
        assert!(reg.insert_if_absent("a".into(), pending.clone()));

        let running = JobSlot::running(CancellationToken::new());
        assert!(reg.replace_if_equal(&"a".into(), &pending, running.clone()));
        assert_eq!(
            reg.get(&"a".into()).map(|s| s.status()),
            Some(JobStatus::Running)
        );

        // the pending context is stale now; a second CAS on it must lose
        assert!(!reg.replace_if_equal(&"a".into(), &pending, JobSlot::canceled()));
        assert_eq!(
            reg.get(&"a".into()).map(|s| s.status()),
            Some(JobStatus::Running)
        );
    }

    #[test]
    fn remove_if_equal_spares_a_replacement() {
        let reg: Registry<String> = Registry::new();
        let first = JobSlot::pending();
        assert!(reg.insert_if_absent("a".into(), first.clone()));

        // a racing resubmission wins the slot
        assert!(reg.remove_if_equal(&"a".into(), &first));
        let second = JobSlot::pending();
        assert!(reg.insert_if_absent("a".into(), second.clone()));

        // the outgoing runner's stale conditional remove must be a no-op
        assert!(!reg.remove_if_equal(&"a".into(), &first));
        assert_eq!(reg.len(), 1);

        assert!(reg.remove_if_equal(&"a".into(), &second));
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn keys_snapshot_and_clear() {
        let reg: Registry<String> = Registry::new();
        reg.insert_if_absent("a".into(), JobSlot::pending());
        reg.insert_if_absent("b".into(), JobSlot::pending());

        let mut keys = reg.keys();
        keys.sort_unstable();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        reg.clear();
        assert!(reg.keys().is_empty());
    }

    #[test]
    fn clones_share_context_identity() {
        let slot = JobSlot::pending();
        assert!(slot.same_context(&slot.clone()));
        assert!(!slot.same_context(&JobSlot::pending()));
    }

    #[test]
    fn raise_cancel_trips_the_running_token() {
        let token = CancellationToken::new();
        let slot = JobSlot::running(token.clone());
        slot.raise_cancel();
        assert!(token.is_cancelled());

        // pending slots have nothing to raise
        JobSlot::pending().raise_cancel();
    }
}

//! The `Epoch` identifier and the atomic/mutex substrate the coordinator
//! is built on.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::thread::ThreadId;

/// An identifier for a single slow- or fast-path attempt.
///
/// Epochs wrap on overflow and are compared only by equality — never by
/// `<`/`>`. The type deliberately does not implement `PartialOrd`/`Ord`,
/// so introducing an ordering comparison as an "optimization" is a
/// compile error rather than a code-review finding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Epoch(u32);

impl Epoch {
    /// Wraps a raw epoch number. Callers (the preprocessor / typecheck
    /// driver) own epoch allocation; the coordinator only ever compares
    /// epochs it's given.
    pub const fn new(value: u32) -> Self {
        Epoch(value)
    }

    /// The zero epoch; the initial value of all three counters.
    pub const ZERO: Epoch = Epoch(0);

    /// Returns the next epoch after this one, wrapping on overflow.
    ///
    /// Not used internally by the coordinator — a convenience for
    /// callers assembling `from`/`to` arguments for `start_commit_epoch`.
    pub const fn wrapping_next(self) -> Epoch {
        Epoch(self.0.wrapping_add(1))
    }

    pub(crate) fn load(atomic: &AtomicU32, ordering: Ordering) -> Epoch {
        Epoch(atomic.load(ordering))
    }

    pub(crate) fn store(self, atomic: &AtomicU32, ordering: Ordering) {
        atomic.store(self.0, ordering)
    }
}

impl fmt::Debug for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Epoch({})", self.0)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Thread identities pinned by [`crate::thread_guard::assert_consistent_thread`].
///
/// Lives inside `EpochState::mutex` since each slot is written at most
/// once and is only ever read or written while holding that same lock.
#[derive(Default)]
pub(crate) struct ThreadSlots {
    pub(crate) preprocess_thread: Option<ThreadId>,
    pub(crate) typecheck_thread: Option<ThreadId>,
}

/// The process-wide substrate: three atomics plus the mutex that guards
/// their compound transitions and the pinned thread identities.
///
/// The atomics are independently `Sync` and may be read without the
/// mutex (see [`crate::coordinator::EpochCoordinator::was_typechecking_canceled`]);
/// every *write*, and every *read that must be consistent across more
/// than one counter*, happens under `mutex`.
pub(crate) struct EpochState {
    pub(crate) committed: AtomicU32,
    pub(crate) processing: AtomicU32,
    pub(crate) invalidator: AtomicU32,
    pub(crate) mutex: Mutex<ThreadSlots>,
}

impl EpochState {
    pub(crate) fn new() -> Self {
        EpochState {
            committed: AtomicU32::new(Epoch::ZERO.0),
            processing: AtomicU32::new(Epoch::ZERO.0),
            invalidator: AtomicU32::new(Epoch::ZERO.0),
            mutex: Mutex::new(ThreadSlots::default()),
        }
    }

    /// Test-only constructor that seeds all three counters at an
    /// arbitrary value, used to exercise wrap-around near `u32::MAX`
    /// without running through 2^32 real transitions.
    #[cfg(test)]
    pub(crate) fn new_seeded(epoch: Epoch) -> Self {
        EpochState {
            committed: AtomicU32::new(epoch.0),
            processing: AtomicU32::new(epoch.0),
            invalidator: AtomicU32::new(epoch.0),
            mutex: Mutex::new(ThreadSlots::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_equality_is_the_only_comparison() {
        assert_eq!(Epoch::new(5), Epoch::new(5));
        assert_ne!(Epoch::new(5), Epoch::new(6));
    }

    #[test]
    fn epoch_wraps_on_overflow() {
        assert_eq!(Epoch::new(u32::MAX).wrapping_next(), Epoch::ZERO);
    }

    #[test]
    fn epoch_state_send_and_sync() {
        static_assertions::assert_impl_all!(EpochState: Send, Sync);
    }
}

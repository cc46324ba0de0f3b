use std::fmt;

use crate::epoch::Epoch;

/// A snapshot of the coordinator's state, derived from a single
/// consistent read of the three epoch counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypecheckingStatus {
    /// Whether a slow path is currently in flight (`processing != committed`).
    pub slow_path_running: bool,
    /// Whether the in-flight slow path has been requested-canceled
    /// (`processing != invalidator`). Always `false` when
    /// `slow_path_running` is `false` (invariant I2).
    pub slow_path_canceled: bool,
    /// The most recently committed epoch.
    pub committed_epoch: Epoch,
    /// The epoch currently being processed (equal to `committed_epoch`
    /// when no slow path is running).
    pub processing_epoch: Epoch,
}

impl fmt::Display for TypecheckingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "committed={} processing={} running={} canceled={}",
            self.committed_epoch, self.processing_epoch, self.slow_path_running, self.slow_path_canceled
        )
    }
}

/// Pure derivation from the three raw counters to a status snapshot.
///
/// Callers must supply a consistent snapshot of all three values (taken
/// under `EpochState::mutex`), except for the deliberately lock-free use
/// in `was_typechecking_canceled`, which only needs `processing` and
/// `invalidator` and tolerates transient staleness.
pub(crate) fn derive_status(committed: Epoch, processing: Epoch, invalidator: Epoch) -> TypecheckingStatus {
    TypecheckingStatus {
        slow_path_running: processing != committed,
        slow_path_canceled: processing != invalidator,
        committed_epoch: committed,
        processing_epoch: processing,
    }
}

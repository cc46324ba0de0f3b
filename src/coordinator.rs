//! The epoch coordinator: the state machine that lets a long-running
//! slow-path typecheck be preempted by a newly arriving fast-path commit
//! or an explicit cancellation request.

use std::sync::atomic::Ordering;

use crate::epoch::{Epoch, EpochState};
use crate::error::{fatal, CoordinatorViolation};
use crate::preemption::PreemptionHook;
use crate::status::{derive_status, TypecheckingStatus};
use crate::thread_guard::enforce_consistent_thread;

/// The coordinator itself: owns the epoch state and exposes the
/// role-gated operations each cooperating thread is allowed to call.
///
/// Safe to share across threads behind an `Arc`; every public method
/// takes `&self`.
pub struct EpochCoordinator {
    state: EpochState,
}

impl Default for EpochCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl EpochCoordinator {
    /// Creates a coordinator with all counters at `Epoch::ZERO` and no
    /// thread pinned yet.
    pub fn new() -> Self {
        EpochCoordinator {
            state: EpochState::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn new_seeded(epoch: Epoch) -> Self {
        EpochCoordinator {
            state: EpochState::new_seeded(epoch),
        }
    }

    /// Opens a new slow-path attempt at epoch `to`, retroactively
    /// acknowledging that the fast path most recently committed at
    /// epoch `from`.
    ///
    /// Must be called from the typecheck thread. Fatal if `from == to`,
    /// or if `to` already equals the currently processing or committed
    /// epoch.
    pub fn start_commit_epoch(&self, from: Epoch, to: Epoch) {
        let mut slots = self.lock();
        enforce_consistent_thread(&mut slots.typecheck_thread, "start_commit_epoch", "typecheck");

        let committed = self.load_committed();
        let processing = self.load_processing();

        if from == to {
            fatal(CoordinatorViolation::SameFromAndTo { from, to });
        }
        if to == processing || to == committed {
            fatal(CoordinatorViolation::EpochAlreadyInFlight { to });
        }

        self.store_processing(to);
        self.store_invalidator(to);
        self.store_committed(from);

        tracing::debug!(?from, ?to, "slow path opened");
    }

    /// Requests cancellation of the in-flight slow path, retargeting the
    /// invalidator to `new_epoch`. Must be called from the preprocess
    /// thread.
    ///
    /// Returns `true` if a running slow path was marked canceled,
    /// `false` if there was nothing to cancel (no slow path in flight).
    /// Does not guarantee the typecheck thread has yet observed the
    /// cancellation; callers poll `was_typechecking_canceled` for that.
    pub fn try_cancel_slow_path(&self, new_epoch: Epoch) -> bool {
        let mut slots = self.lock();
        enforce_consistent_thread(&mut slots.preprocess_thread, "try_cancel_slow_path", "preprocess");

        let processing = self.load_processing();
        let committed = self.load_committed();

        if new_epoch == processing {
            fatal(CoordinatorViolation::CancelTargetMatchesProcessing { new_epoch });
        }
        if processing == committed {
            return false;
        }

        self.store_invalidator(new_epoch);
        tracing::debug!(?new_epoch, "slow path canceled");
        true
    }

    /// Cheap, lock-free check: has the in-flight slow path (if any) been
    /// requested-canceled? Safe to call from any worker thread in an
    /// inner loop. May transiently report a stale answer.
    pub fn was_typechecking_canceled(&self) -> bool {
        let processing = Epoch::load(&self.state.processing, Ordering::Acquire);
        let invalidator = Epoch::load(&self.state.invalidator, Ordering::Acquire);
        processing != invalidator
    }

    /// Runs `work` and attempts to commit `epoch`. Must be called from
    /// the typecheck thread.
    ///
    /// In non-cancelable mode (`is_cancelable = false`), `work` just runs
    /// and this always returns `true`; no epoch-state interaction
    /// happens at all. It is fatal to call this in non-cancelable mode
    /// while a slow path opened by `start_commit_epoch` is still
    /// outstanding, rather than silently ignoring it.
    ///
    /// In cancelable mode, `work` runs *outside* the mutex so that
    /// `try_cancel_slow_path` can interleave with it. After `work`
    /// returns, the commit-or-rollback decision is made atomically
    /// under the mutex, and the optional `preemption_hook` is invoked
    /// exactly once after the mutex is released, regardless of outcome.
    pub fn try_commit_epoch<F>(
        &self,
        epoch: Epoch,
        is_cancelable: bool,
        preemption_hook: Option<&dyn PreemptionHook>,
        work: F,
    ) -> bool
    where
        F: FnOnce(),
    {
        if !is_cancelable {
            {
                let mut slots = self.lock();
                enforce_consistent_thread(&mut slots.typecheck_thread, "try_commit_epoch", "typecheck");
                if self.load_processing() != self.load_committed() {
                    fatal(CoordinatorViolation::NonCancelableWhileOpen);
                }
            }
            work();
            return true;
        }

        {
            let mut slots = self.lock();
            enforce_consistent_thread(&mut slots.typecheck_thread, "try_commit_epoch", "typecheck");
            if self.load_processing() != epoch {
                fatal(CoordinatorViolation::CommitEpochMismatch { epoch });
            }
        } // mutex released here -- `work` must run unlocked.

        work();

        let committed = {
            let _slots = self.lock();
            let processing = self.load_processing();
            let invalidator = self.load_invalidator();

            if processing == invalidator {
                let committed_now = self.load_committed();
                if committed_now == processing {
                    fatal(CoordinatorViolation::DoubleCommit { epoch: processing });
                }
                self.store_committed(processing);
                tracing::debug!(?processing, "slow path committed");
                true
            } else {
                let last_committed = self.load_committed();
                self.store_processing(last_committed);
                self.store_invalidator(last_committed);
                tracing::debug!(?last_committed, "slow path rolled back");
                false
            }
        }; // mutex released here -- the preemption hook must run unlocked.

        if let Some(hook) = preemption_hook {
            hook.try_run_scheduled_preemption_task();
        }

        committed
    }

    /// Acquires the mutex, passes a freshly derived status snapshot to
    /// `f`, and releases the mutex on every exit path (including panics
    /// unwinding through `f`).
    pub fn with_epoch_lock<F, R>(&self, f: F) -> R
    where
        F: FnOnce(TypecheckingStatus) -> R,
    {
        let _slots = self.lock();
        let status = self.snapshot_locked();
        f(status)
    }

    /// Returns a snapshot of the current status.
    pub fn get_status(&self) -> TypecheckingStatus {
        let _slots = self.lock();
        self.snapshot_locked()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, crate::epoch::ThreadSlots> {
        self.state.mutex.lock().expect("epoch state mutex poisoned")
    }

    fn snapshot_locked(&self) -> TypecheckingStatus {
        derive_status(self.load_committed(), self.load_processing(), self.load_invalidator())
    }

    fn load_committed(&self) -> Epoch {
        Epoch::load(&self.state.committed, Ordering::Acquire)
    }

    fn load_processing(&self) -> Epoch {
        Epoch::load(&self.state.processing, Ordering::Acquire)
    }

    fn load_invalidator(&self) -> Epoch {
        Epoch::load(&self.state.invalidator, Ordering::Acquire)
    }

    fn store_committed(&self, epoch: Epoch) {
        epoch.store(&self.state.committed, Ordering::Release);
    }

    fn store_processing(&self, epoch: Epoch) {
        epoch.store(&self.state.processing, Ordering::Release);
    }

    fn store_invalidator(&self, epoch: Epoch) {
        epoch.store(&self.state.invalidator, Ordering::Release);
    }
}

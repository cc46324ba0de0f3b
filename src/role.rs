//! Role-scoped views over a shared [`EpochCoordinator`].
//!
//! The coordinator's runtime thread-pinning guard (`thread_guard`)
//! catches the "right role, wrong thread" misuse. These wrappers catch
//! the "wrong role entirely" misuse at compile time: a `WorkerRole`
//! handle simply has no method that could call `try_cancel_slow_path`.
//! `EpochCoordinator` remains fully usable on its own for callers that
//! don't want the extra layer.

use std::sync::Arc;

use crate::coordinator::EpochCoordinator;
use crate::epoch::Epoch;
use crate::preemption::PreemptionHook;
use crate::status::TypecheckingStatus;

/// A shared coordinator plus the three role-scoped views onto it.
///
/// `CoordinatorHandle::split` is typically called once at startup; the
/// resulting roles are handed to the typecheck thread, the preprocess
/// thread, and the worker pool respectively.
#[derive(Clone)]
pub struct CoordinatorHandle {
    inner: Arc<EpochCoordinator>,
}

impl CoordinatorHandle {
    pub fn new() -> Self {
        CoordinatorHandle {
            inner: Arc::new(EpochCoordinator::new()),
        }
    }

    /// Splits into the three role-scoped views, all backed by the same
    /// coordinator.
    pub fn split(&self) -> (TypecheckRole, PreprocessRole, WorkerRole) {
        (
            TypecheckRole { inner: self.inner.clone() },
            PreprocessRole { inner: self.inner.clone() },
            WorkerRole { inner: self.inner.clone() },
        )
    }

    /// Escape hatch back to the full coordinator, e.g. for tooling that
    /// wants `get_status` without being handed a specific role.
    pub fn coordinator(&self) -> &EpochCoordinator {
        &self.inner
    }
}

impl Default for CoordinatorHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the single typecheck thread may call.
#[derive(Clone)]
pub struct TypecheckRole {
    inner: Arc<EpochCoordinator>,
}

impl TypecheckRole {
    pub fn start_commit_epoch(&self, from: Epoch, to: Epoch) {
        self.inner.start_commit_epoch(from, to);
    }

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
        self.inner.try_commit_epoch(epoch, is_cancelable, preemption_hook, work)
    }

    pub fn get_status(&self) -> TypecheckingStatus {
        self.inner.get_status()
    }

    pub fn with_epoch_lock<F, R>(&self, f: F) -> R
    where
        F: FnOnce(TypecheckingStatus) -> R,
    {
        self.inner.with_epoch_lock(f)
    }
}

/// Everything the single preprocess thread may call.
#[derive(Clone)]
pub struct PreprocessRole {
    inner: Arc<EpochCoordinator>,
}

impl PreprocessRole {
    pub fn try_cancel_slow_path(&self, new_epoch: Epoch) -> bool {
        self.inner.try_cancel_slow_path(new_epoch)
    }

    pub fn get_status(&self) -> TypecheckingStatus {
        self.inner.get_status()
    }

    pub fn with_epoch_lock<F, R>(&self, f: F) -> R
    where
        F: FnOnce(TypecheckingStatus) -> R,
    {
        self.inner.with_epoch_lock(f)
    }
}

/// Everything the (many) worker threads may call.
#[derive(Clone)]
pub struct WorkerRole {
    inner: Arc<EpochCoordinator>,
}

impl WorkerRole {
    pub fn was_typechecking_canceled(&self) -> bool {
        self.inner.was_typechecking_canceled()
    }
}

//! Fatal-violation types for the epoch coordinator.
//!
//! None of these are ever returned to a caller as a recoverable `Result`:
//! they exist to give [`fatal`] a precise, typed message to log and panic
//! with. A violation here means a caller broke the coordinator's protocol
//! (wrong thread, bad precondition, double commit) — not a runtime
//! condition the caller can recover from.

use crate::epoch::Epoch;

/// A protocol violation: the caller used the coordinator incorrectly.
///
/// These are programming-error conditions (wrong thread, bad
/// precondition, double commit), not recoverable runtime conditions.
/// Cooperative cancellation is not represented here at all — it's a
/// normal `bool` return from `try_commit_epoch`/`was_typechecking_canceled`.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorViolation {
    #[error(
        "{method} may only be called from the {role} thread; a second thread attempted to call it"
    )]
    ThreadPinningViolation {
        method: &'static str,
        role: &'static str,
    },

    #[error("start_commit_epoch(from={from:?}, to={to:?}): from and to must differ")]
    SameFromAndTo { from: Epoch, to: Epoch },

    #[error(
        "start_commit_epoch(to={to:?}): to must not equal the currently processing or committed epoch"
    )]
    EpochAlreadyInFlight { to: Epoch },

    #[error(
        "try_cancel_slow_path(new_epoch={new_epoch:?}): new_epoch must not equal the epoch currently processing"
    )]
    CancelTargetMatchesProcessing { new_epoch: Epoch },

    #[error("try_commit_epoch(epoch={epoch:?}): epoch does not match the epoch currently processing")]
    CommitEpochMismatch { epoch: Epoch },

    #[error("double commit detected: committed epoch already equals {epoch:?}")]
    DoubleCommit { epoch: Epoch },

    #[error("start_commit_epoch called while a non-cancelable try_commit_epoch is outstanding")]
    NonCancelableWhileOpen,
}

/// Reports `violation` and aborts the current thread.
///
/// This is the only way a [`CoordinatorViolation`] is surfaced: logged at
/// `error` level (so it shows up in whatever the embedding server's log
/// sink is) and then turned into a panic — fatal violations abort the
/// process rather than propagating as a recoverable error.
#[cold]
pub(crate) fn fatal(violation: CoordinatorViolation) -> ! {
    tracing::error!(%violation, "epoch coordinator protocol violation");
    panic!("{violation}");
}

//! Pins an operation to the thread that first invoked it.
//!
//! Three roles interact with the coordinator (typecheck thread,
//! preprocess thread, many worker threads). The typecheck and preprocess
//! roles are each expected to be exactly one persistent OS thread for
//! the lifetime of the process; this module enforces that expectation
//! and fails loudly the moment it's violated, rather than letting two
//! threads race on epoch state that assumes a single writer per role.

use std::thread::ThreadId;

use crate::error::CoordinatorViolation;

/// Checks `slot` against the calling thread, storing the identity on
/// first use. Must be called while holding `EpochState::mutex`.
///
/// Returns `Err` on mismatch rather than panicking directly, so the
/// caller can decide whether to escalate via [`crate::error::fatal`]
/// (the default) or merely warn, per the `strict-thread-pinning`
/// feature (see `Cargo.toml`).
pub(crate) fn assert_consistent_thread(
    slot: &mut Option<ThreadId>,
    method_name: &'static str,
    role_name: &'static str,
) -> Result<(), CoordinatorViolation> {
    let current = std::thread::current().id();
    match *slot {
        None => {
            *slot = Some(current);
            Ok(())
        }
        Some(expected) if expected == current => Ok(()),
        Some(_) => Err(CoordinatorViolation::ThreadPinningViolation {
            method: method_name,
            role: role_name,
        }),
    }
}

/// Runs [`assert_consistent_thread`] and escalates a mismatch according
/// to the `strict-thread-pinning` feature: a panic by default, or a
/// logged warning for embedders that opted out (see `Cargo.toml`).
pub(crate) fn enforce_consistent_thread(slot: &mut Option<ThreadId>, method_name: &'static str, role_name: &'static str) {
    if let Err(violation) = assert_consistent_thread(slot, method_name, role_name) {
        if cfg!(feature = "strict-thread-pinning") {
            crate::error::fatal(violation);
        } else {
            tracing::warn!(%violation, "ignoring thread-pinning violation (strict-thread-pinning disabled)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_pins_the_thread() {
        let mut slot = None;
        assert!(assert_consistent_thread(&mut slot, "method", "role").is_ok());
        assert_eq!(slot, Some(std::thread::current().id()));
    }

    #[test]
    fn same_thread_is_consistent() {
        let mut slot = None;
        assert_consistent_thread(&mut slot, "method", "role").unwrap();
        assert!(assert_consistent_thread(&mut slot, "method", "role").is_ok());
    }

    #[test]
    fn different_thread_is_a_violation() {
        let mut slot = None;
        assert_consistent_thread(&mut slot, "method", "role").unwrap();

        let result = std::thread::spawn(move || assert_consistent_thread(&mut slot, "method", "role"))
            .join()
            .unwrap();

        assert!(matches!(
            result,
            Err(CoordinatorViolation::ThreadPinningViolation { .. })
        ));
    }
}

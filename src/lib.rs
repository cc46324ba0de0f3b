/*!
`epoch_coordinator` lets a long-running whole-program typecheck (the
"slow path") be preempted by newly arriving edits or short incremental
typechecks (the "fast path") in a language-server setting.

It encodes a three-way protocol between three cooperating threads —
exactly one typecheck thread, exactly one preprocess thread, and any
number of worker threads — in three wrapping, equality-only epoch
counters plus a mutex. It does not perform any typechecking itself: the
slow-path work is a caller-supplied closure that cooperatively polls
[`EpochCoordinator::was_typechecking_canceled`].

```rust
use epoch_coordinator::{Epoch, EpochCoordinator};

let coordinator = EpochCoordinator::new();

// The typecheck thread opens a slow path at epoch 1, acknowledging that
// fast-path commits up through epoch 0 already landed.
coordinator.start_commit_epoch(Epoch::new(0), Epoch::new(1));

let committed = coordinator.try_commit_epoch(Epoch::new(1), true, None, || {
    // ... whole-program typecheck work goes here, periodically checking
    // `coordinator.was_typechecking_canceled()` ...
});
assert!(committed);
assert_eq!(coordinator.get_status().committed_epoch, Epoch::new(1));
```
*/

mod coordinator;
mod epoch;
mod error;
mod preemption;
mod role;
mod status;
mod thread_guard;

pub mod allocator;

pub use coordinator::EpochCoordinator;
pub use epoch::Epoch;
pub use error::CoordinatorViolation;
pub use preemption::{NoopPreemptionHook, PreemptionHook};
pub use role::{CoordinatorHandle, PreprocessRole, TypecheckRole, WorkerRole};
pub use status::TypecheckingStatus;

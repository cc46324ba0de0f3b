//! The smallest possible slow-path commit, run single-threaded: open an
//! epoch, run some work, commit it. No cancellation involved.

use epoch_coordinator::{Epoch, EpochCoordinator};

fn whole_program_typecheck(coordinator: &EpochCoordinator) -> i32 {
    let mut sum = 0;
    for file_id in 0..5 {
        if coordinator.was_typechecking_canceled() {
            println!("canceled at file {file_id}, bailing out early");
            return sum;
        }
        sum += file_id;
    }
    sum
}

fn main() {
    let coordinator = EpochCoordinator::new();

    // Fast-path commits up through epoch 0 already landed; open a slow
    // path targeting epoch 1.
    coordinator.start_commit_epoch(Epoch::new(0), Epoch::new(1));

    let mut result = 0;
    let committed = coordinator.try_commit_epoch(Epoch::new(1), true, None, || {
        result = whole_program_typecheck(&coordinator);
    });

    assert!(committed);
    println!("committed epoch 1, typecheck result = {result}");

    let status = coordinator.get_status();
    println!("{status}");
}

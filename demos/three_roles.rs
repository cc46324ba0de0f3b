//! A closer approximation of the real deployment: a typecheck thread, a
//! preprocess thread, and a worker thread, each holding only the
//! role-scoped view of the coordinator it's entitled to. The preprocess
//! thread cancels the slow path partway through; the worker observes
//! the cancellation and the typecheck thread rolls back instead of
//! committing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

use epoch_coordinator::{CoordinatorHandle, Epoch};

fn main() {
    let handle = CoordinatorHandle::new();
    let (typecheck, preprocess, worker) = handle.split();

    let worker_saw_cancel = Arc::new(AtomicBool::new(false));
    let ready = Arc::new(Barrier::new(3));

    let worker_thread = {
        let worker_saw_cancel = worker_saw_cancel.clone();
        let ready = ready.clone();
        std::thread::spawn(move || {
            ready.wait();
            loop {
                if worker.was_typechecking_canceled() {
                    worker_saw_cancel.store(true, Ordering::SeqCst);
                    break;
                }
                std::thread::sleep(Duration::from_millis(1));
            }
        })
    };

    let preprocess_thread = {
        let ready = ready.clone();
        std::thread::spawn(move || {
            ready.wait();
            std::thread::sleep(Duration::from_millis(5));
            let canceled = preprocess.try_cancel_slow_path(Epoch::new(2));
            println!("preprocess thread: try_cancel_slow_path -> {canceled}");
        })
    };

    typecheck.start_commit_epoch(Epoch::new(0), Epoch::new(1));
    ready.wait();

    let committed = typecheck.try_commit_epoch(Epoch::new(1), true, None, || {
        // Pretend this is the whole-program typecheck; it would
        // normally poll `was_typechecking_canceled` through its own
        // `WorkerRole` (or directly, if it runs on the typecheck
        // thread itself) and stop early.
        std::thread::sleep(Duration::from_millis(20));
    });

    preprocess_thread.join().unwrap();
    worker_thread.join().unwrap();

    println!("slow path committed: {committed}");
    println!("worker observed cancellation: {}", worker_saw_cancel.load(Ordering::SeqCst));
    println!("{}", typecheck.get_status());
}

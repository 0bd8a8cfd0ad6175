//! Integration tests for cross-thread UI dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use horizon_trellis_core::dispatch::{QueuedDispatcher, UiDispatcher, run_blocking};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn test_concurrent_blocking_waits_complete() {
    init_tracing();
    let dispatcher = Arc::new(QueuedDispatcher::spawn());
    let counter = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let dispatcher = dispatcher.clone();
        let counter = counter.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..50 {
                let value = run_blocking(dispatcher.as_ref(), {
                    let counter = counter.clone();
                    move || counter.fetch_add(1, Ordering::AcqRel)
                })
                .unwrap();
                assert!(value < 400);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(counter.load(Ordering::Acquire), 400);

    dispatcher.shutdown_and_join();
}

#[test]
fn test_blocking_wait_observes_ui_thread_side_effects() {
    init_tracing();
    let dispatcher = QueuedDispatcher::spawn();

    // The UI thread mutates, the caller observes after the wait returns.
    let state = Arc::new(parking_lot::Mutex::new(Vec::new()));
    for i in 0..10 {
        let state = state.clone();
        run_blocking(&dispatcher, move || state.lock().push(i)).unwrap();
    }
    assert_eq!(*state.lock(), (0..10).collect::<Vec<_>>());

    dispatcher.shutdown_and_join();
}

#[test]
fn test_reentrant_wait_is_detected_not_deadlocked() {
    init_tracing();
    let dispatcher = Arc::new(QueuedDispatcher::spawn());

    let inner = dispatcher.clone();
    let err = run_blocking(dispatcher.as_ref(), move || {
        run_blocking(inner.as_ref(), || ()).unwrap_err()
    })
    .unwrap();
    assert!(err.is_dispatch());

    // The pump is still alive afterwards.
    assert_eq!(run_blocking(dispatcher.as_ref(), || 7).unwrap(), 7);
    dispatcher.shutdown_and_join();
}

#[test]
fn test_manual_pump_from_owning_thread() {
    init_tracing();
    let dispatcher = Arc::new(QueuedDispatcher::new());
    let done = Arc::new(AtomicUsize::new(0));

    let poster = {
        let dispatcher = dispatcher.clone();
        let done = done.clone();
        std::thread::spawn(move || {
            run_blocking(dispatcher.as_ref(), move || {
                done.fetch_add(1, Ordering::AcqRel);
            })
            .unwrap();
        })
    };

    // Pump until the posted task has run.
    while done.load(Ordering::Acquire) == 0 {
        if dispatcher.run_pending() == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
    }
    assert!(dispatcher.is_ui_thread());
    poster.join().unwrap();
}

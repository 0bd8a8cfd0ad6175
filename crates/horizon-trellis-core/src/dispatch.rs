//! Cross-thread dispatch onto the UI thread.
//!
//! Widget mutations must happen on a single UI thread, while service
//! lifecycle events arrive from arbitrary threads. [`UiDispatcher`] is the
//! seam between the two: callers post closures to it and optionally block
//! until the UI thread has run them. [`QueuedDispatcher`] is the queue-backed
//! implementation shipped with the framework; whichever thread pumps it
//! becomes the UI thread.
//!
//! Blocking is the default discipline for visual mutations: by the time a
//! manage or state-change call returns, the widgets reflect the new state.
//! [`run_blocking`] enforces the one rule that makes this safe: a blocking
//! wait issued from the UI thread itself is refused with a dispatch error
//! instead of deadlocking on the queue.
//!
//! # Example
//!
//! ```
//! use horizon_trellis_core::dispatch::{run_blocking, QueuedDispatcher};
//!
//! let dispatcher = QueuedDispatcher::spawn();
//!
//! let answer = run_blocking(&dispatcher, || 6 * 7)?;
//! assert_eq!(answer, 42);
//!
//! dispatcher.shutdown_and_join();
//! # Ok::<(), horizon_trellis_core::Error>(())
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

/// A handle for signaling completion of a dispatched task.
pub struct CompletionHandle {
    inner: Arc<CompletionState>,
}

impl CompletionHandle {
    /// Signal that the task has finished.
    pub fn signal_done(self) {
        let mut done = self.inner.done.lock();
        *done = true;
        self.inner.condvar.notify_all();
    }
}

/// A waiter for blocking on task completion.
pub struct CompletionWaiter {
    inner: Arc<CompletionState>,
}

impl CompletionWaiter {
    /// Wait for the task to complete.
    ///
    /// This blocks the current thread until the dispatcher has run the task
    /// (or discarded it during shutdown).
    pub fn wait(self) {
        let mut done = self.inner.done.lock();
        while !*done {
            self.inner.condvar.wait(&mut done);
        }
    }

    /// Wait for the task to complete with a timeout.
    ///
    /// Returns `true` if the task completed, `false` if the timeout elapsed.
    pub fn wait_timeout(self, timeout: Duration) -> bool {
        let mut done = self.inner.done.lock();
        if *done {
            return true;
        }
        let result = self.inner.condvar.wait_for(&mut done, timeout);
        *done || !result.timed_out()
    }

    /// Whether the task has already completed.
    pub fn is_done(&self) -> bool {
        *self.inner.done.lock()
    }
}

struct CompletionState {
    done: Mutex<bool>,
    condvar: Condvar,
}

/// Create a completion handle/waiter pair for blocking dispatch.
pub fn completion_pair() -> (CompletionHandle, CompletionWaiter) {
    let state = Arc::new(CompletionState {
        done: Mutex::new(false),
        condvar: Condvar::new(),
    });

    (
        CompletionHandle {
            inner: state.clone(),
        },
        CompletionWaiter { inner: state },
    )
}

/// Executor seam for running closures on the UI thread.
///
/// Implementations must deliver posted tasks to exactly one thread and
/// signal the returned waiter once the task has run. A task that will never
/// run (dispatcher shut down) must still have its waiter signaled so that
/// blocked callers wake up.
pub trait UiDispatcher: Send + Sync {
    /// Queue a task for execution on the UI thread.
    ///
    /// Returns a waiter that completes when the task has run.
    fn post(&self, task: Box<dyn FnOnce() + Send>) -> CompletionWaiter;

    /// Whether the calling thread is the UI thread.
    fn is_ui_thread(&self) -> bool;
}

/// Run a closure on the UI thread and block until it returns.
///
/// The closure's return value is handed back to the caller. Calling this
/// from the UI thread itself returns a dispatch error: the wait could never
/// complete because the queue is serviced by the blocked thread.
pub fn run_blocking<T, F>(dispatcher: &dyn UiDispatcher, task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    if dispatcher.is_ui_thread() {
        return Err(Error::dispatch(
            "blocking dispatch from the UI thread would deadlock on its own queue",
        ));
    }

    let slot: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
    let task_slot = Arc::clone(&slot);
    let waiter = dispatcher.post(Box::new(move || {
        *task_slot.lock() = Some(task());
    }));
    waiter.wait();

    slot.lock()
        .take()
        .ok_or_else(|| Error::dispatch("dispatched task was discarded before it ran"))
}

/// A task sent to the dispatcher queue.
enum UiTask {
    /// Execute a closure and signal its completion.
    Execute {
        run: Box<dyn FnOnce() + Send>,
        completion: CompletionHandle,
    },
    /// Shutdown signal.
    Shutdown,
}

/// Internal state shared between the dispatcher handle and the pump thread.
struct DispatcherState {
    /// Whether the dispatcher accepts new tasks.
    running: AtomicBool,
    /// Identity of the thread that pumps the queue, claimed on first pump.
    ui_thread: Mutex<Option<ThreadId>>,
}

impl DispatcherState {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            ui_thread: Mutex::new(None),
        }
    }

    /// Claim the current thread as the UI thread.
    ///
    /// The first pumping thread wins; returns `false` when a different
    /// thread already claimed the queue.
    fn claim_ui_thread(&self) -> bool {
        let mut ui_thread = self.ui_thread.lock();
        match *ui_thread {
            Some(id) => id == thread::current().id(),
            None => {
                *ui_thread = Some(thread::current().id());
                true
            }
        }
    }

    fn is_ui_thread(&self) -> bool {
        *self.ui_thread.lock() == Some(thread::current().id())
    }
}

/// Queue-backed [`UiDispatcher`].
///
/// Tasks are executed in post order by the pumping thread. Use
/// [`QueuedDispatcher::spawn`] for a dedicated pump thread, or
/// [`QueuedDispatcher::new`] plus [`run_pending`](Self::run_pending) /
/// [`run_until_shutdown`](Self::run_until_shutdown) to pump from a thread
/// you own (an event loop, or a test).
///
/// # Thread Safety
///
/// `QueuedDispatcher` is `Send + Sync`; any thread may post. Only the
/// claimed UI thread may pump.
pub struct QueuedDispatcher {
    /// Channel sender for submitting tasks.
    sender: Sender<UiTask>,
    /// Channel receiver, pumped by the UI thread.
    receiver: Receiver<UiTask>,
    /// Shared state with the pump thread.
    state: Arc<DispatcherState>,
    /// Pump thread handle for joining, when spawned.
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl QueuedDispatcher {
    /// Create a dispatcher without a pump thread.
    ///
    /// The owner is responsible for pumping via `run_pending` or
    /// `run_until_shutdown`; the first pumping thread becomes the UI thread.
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            state: Arc::new(DispatcherState::new()),
            handle: Mutex::new(None),
        }
    }

    /// Create a dispatcher with a dedicated pump thread.
    ///
    /// The spawned thread claims UI-thread identity and processes tasks
    /// until [`shutdown`](Self::shutdown) is called.
    pub fn spawn() -> Self {
        let dispatcher = Self::new();
        let receiver = dispatcher.receiver.clone();
        let state = dispatcher.state.clone();

        let handle = thread::Builder::new()
            .name("trellis-ui".to_string())
            .spawn(move || pump_loop(&receiver, &state))
            .expect("Failed to spawn UI dispatch thread");

        *dispatcher.handle.lock() = Some(handle);
        dispatcher
    }

    /// Whether the dispatcher still accepts tasks.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Run all currently queued tasks on the calling thread.
    ///
    /// Claims UI-thread identity on first use. Returns the number of tasks
    /// executed. Does nothing (and returns 0) when called from a thread
    /// other than the claimed UI thread.
    pub fn run_pending(&self) -> usize {
        if !self.state.claim_ui_thread() {
            tracing::warn!(
                target: "horizon_trellis_core::dispatch",
                "run_pending called off the claimed UI thread"
            );
            return 0;
        }

        let mut executed = 0;
        while let Ok(task) = self.receiver.try_recv() {
            match task {
                UiTask::Execute { run, completion } => {
                    run();
                    completion.signal_done();
                    executed += 1;
                }
                UiTask::Shutdown => {
                    self.state.running.store(false, Ordering::Release);
                }
            }
        }
        executed
    }

    /// Pump the queue on the calling thread until shutdown.
    ///
    /// Claims UI-thread identity. Remaining queued tasks are executed
    /// before the loop exits.
    pub fn run_until_shutdown(&self) {
        pump_loop(&self.receiver, &self.state);
    }

    /// Request the dispatcher to stop after processing queued tasks.
    ///
    /// Non-blocking; new posts are rejected immediately (their waiters are
    /// signaled without the task running). Use [`join`](Self::join) to wait
    /// for a spawned pump thread.
    pub fn shutdown(&self) {
        self.state.running.store(false, Ordering::Release);
        let _ = self.sender.send(UiTask::Shutdown);
    }

    /// Wait for the spawned pump thread to finish.
    ///
    /// Returns `true` if the thread was joined, `false` if there was no
    /// spawned thread or it was already joined.
    pub fn join(&self) -> bool {
        let mut handle = self.handle.lock();
        if let Some(h) = handle.take() {
            h.join().is_ok()
        } else {
            false
        }
    }

    /// Shutdown and join the pump thread.
    pub fn shutdown_and_join(&self) -> bool {
        self.shutdown();
        self.join()
    }
}

impl Default for QueuedDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl UiDispatcher for QueuedDispatcher {
    fn post(&self, task: Box<dyn FnOnce() + Send>) -> CompletionWaiter {
        let (handle, waiter) = completion_pair();

        if !self.is_running() {
            handle.signal_done();
            return waiter;
        }

        let message = UiTask::Execute {
            run: task,
            completion: handle,
        };
        if let Err(crossbeam_channel::SendError(message)) = self.sender.send(message) {
            if let UiTask::Execute { completion, .. } = message {
                completion.signal_done();
            }
        }
        waiter
    }

    fn is_ui_thread(&self) -> bool {
        self.state.is_ui_thread()
    }
}

impl Drop for QueuedDispatcher {
    fn drop(&mut self) {
        self.shutdown();
        // Don't block in drop; wake any stragglers without running them.
        while let Ok(task) = self.receiver.try_recv() {
            if let UiTask::Execute { completion, .. } = task {
                completion.signal_done();
            }
        }
    }
}

/// The pump loop run by the UI thread.
fn pump_loop(receiver: &Receiver<UiTask>, state: &DispatcherState) {
    if !state.claim_ui_thread() {
        tracing::warn!(
            target: "horizon_trellis_core::dispatch",
            "pump started on a thread that is not the claimed UI thread"
        );
        return;
    }
    tracing::debug!(target: "horizon_trellis_core::dispatch", "UI dispatch loop started");

    loop {
        match receiver.recv() {
            Ok(UiTask::Execute { run, completion }) => {
                run();
                completion.signal_done();
            }
            Ok(UiTask::Shutdown) => {
                // Process remaining tasks before exiting.
                while let Ok(task) = receiver.try_recv() {
                    match task {
                        UiTask::Execute { run, completion } => {
                            run();
                            completion.signal_done();
                        }
                        UiTask::Shutdown => continue,
                    }
                }
                break;
            }
            Err(_) => break,
        }
    }

    state.running.store(false, Ordering::Release);
    tracing::debug!(target: "horizon_trellis_core::dispatch", "UI dispatch loop stopped");
}

static_assertions::assert_impl_all!(QueuedDispatcher: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_completion_pair() {
        let (handle, waiter) = completion_pair();

        let thread = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            handle.signal_done();
        });

        waiter.wait();
        thread.join().unwrap();
    }

    #[test]
    fn test_completion_timeout() {
        let (_handle, waiter) = completion_pair();

        // Should time out since we never signal
        let completed = waiter.wait_timeout(Duration::from_millis(10));
        assert!(!completed);
    }

    #[test]
    fn test_manual_pump_runs_tasks() {
        let dispatcher = QueuedDispatcher::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        let waiter = dispatcher.post(Box::new(move || {
            c.fetch_add(1, Ordering::AcqRel);
        }));
        assert!(!waiter.is_done());

        assert_eq!(dispatcher.run_pending(), 1);
        assert_eq!(counter.load(Ordering::Acquire), 1);
        assert!(waiter.is_done());
    }

    #[test]
    fn test_pump_claims_ui_thread() {
        let dispatcher = QueuedDispatcher::new();
        assert!(!dispatcher.is_ui_thread());

        dispatcher.run_pending();
        assert!(dispatcher.is_ui_thread());
    }

    #[test]
    fn test_run_blocking_round_trip() {
        let dispatcher = QueuedDispatcher::spawn();

        let value = run_blocking(&dispatcher, || 6 * 7).unwrap();
        assert_eq!(value, 42);

        dispatcher.shutdown_and_join();
    }

    #[test]
    fn test_run_blocking_from_ui_thread_is_error() {
        let dispatcher = Arc::new(QueuedDispatcher::spawn());

        let inner = dispatcher.clone();
        let err = run_blocking(dispatcher.as_ref(), move || {
            run_blocking(inner.as_ref(), || ()).unwrap_err()
        })
        .unwrap();

        assert!(err.is_dispatch());
        dispatcher.shutdown_and_join();
    }

    #[test]
    fn test_post_after_shutdown_signals_immediately() {
        let dispatcher = QueuedDispatcher::new();
        dispatcher.shutdown();

        let waiter = dispatcher.post(Box::new(|| {}));
        assert!(waiter.wait_timeout(Duration::from_millis(100)));

        let err = run_blocking(&dispatcher, || ()).unwrap_err();
        assert!(err.is_dispatch());
    }

    #[test]
    fn test_shutdown_runs_queued_tasks_first() {
        let dispatcher = QueuedDispatcher::spawn();
        let counter = Arc::new(AtomicUsize::new(0));

        let mut waiters = Vec::new();
        for _ in 0..16 {
            let c = counter.clone();
            waiters.push(dispatcher.post(Box::new(move || {
                c.fetch_add(1, Ordering::AcqRel);
            })));
        }

        dispatcher.shutdown_and_join();
        assert_eq!(counter.load(Ordering::Acquire), 16);
        for waiter in waiters {
            assert!(waiter.is_done());
        }
    }

    #[test]
    fn test_tasks_run_in_post_order() {
        let dispatcher = QueuedDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..8 {
            let order = order.clone();
            dispatcher.post(Box::new(move || {
                order.lock().push(i);
            }));
        }

        assert_eq!(dispatcher.run_pending(), 8);
        assert_eq!(*order.lock(), (0..8).collect::<Vec<_>>());
    }
}

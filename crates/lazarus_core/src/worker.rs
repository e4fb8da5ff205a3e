//! # Worker Launcher
//!
//! Starts long-running subsystems (audio, streaming, ...) on their own named
//! threads and hands back an owned handle instead of an untracked thread.
//!
//! ## Architecture
//!
//! ```text
//!   Caller                       Worker thread
//!     │                               │
//!     │ start(worker) ──spawn──────>  │ running = true
//!     │ <── WorkerHandle              │ started.publish(thread id)
//!     │                               │ worker.run(&stop)
//!     │ handle.stop() ──StopSignal──> │   ...observes stop, returns
//!     │ handle.join() <───────────────│ running = false
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::error::WorkerLaunchError;
use crate::sync::AsyncResourceSlot;

/// A component that runs an independent loop on a dedicated thread.
///
/// The worker is fully constructed on the caller's thread and then moved to
/// the new one; `Send + 'static` keeps partially-initialized or borrowed state
/// from crossing the boundary.
pub trait Worker: Send + 'static {
    /// Link the rest of the application uses to talk to the running worker.
    type Control: Clone + Send + 'static;

    /// Thread name for the worker.
    fn name(&self) -> &str;

    /// Returns the control link. Called once, before the worker is moved.
    fn control(&self) -> Self::Control;

    /// The worker's main loop. Should return promptly once `stop` is raised.
    fn run(&mut self, stop: &StopSignal);
}

/// Shared stop request, observable from inside a worker loop.
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

#[derive(Default)]
struct StopInner {
    stopped: Mutex<bool>,
    condvar: Condvar,
}

impl StopSignal {
    /// Creates a signal that has not been raised.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal and wakes anyone sleeping in [`wait_timeout`](Self::wait_timeout).
    pub fn stop(&self) {
        *self.inner.stopped.lock() = true;
        self.inner.condvar.notify_all();
    }

    /// Returns whether the signal has been raised.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.inner.stopped.lock()
    }

    /// Sleeps for up to `timeout`, waking early if the signal is raised.
    ///
    /// Returns `true` if a stop was requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut stopped = self.inner.stopped.lock();
        if !*stopped {
            self.inner.condvar.wait_for(&mut stopped, timeout);
        }
        *stopped
    }
}

impl fmt::Debug for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopSignal")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// How a worker thread ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerExit {
    /// `run` returned normally.
    Completed,
    /// `run` panicked.
    Panicked,
}

/// Starts workers on new threads.
#[derive(Clone, Debug, Default)]
pub struct WorkerLauncher {
    stack_size: Option<usize>,
}

impl WorkerLauncher {
    /// Creates a launcher with the platform's default stack size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stack size for threads started by this launcher.
    #[must_use]
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Runs `worker` on a new named thread and returns immediately.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerLaunchError`] if the thread cannot be spawned.
    pub fn start<W: Worker>(
        &self,
        mut worker: W,
    ) -> Result<WorkerHandle<W::Control>, WorkerLaunchError> {
        let name = worker.name().to_owned();
        let control = worker.control();

        let stop = StopSignal::new();
        let started = Arc::new(AsyncResourceSlot::new());
        let running = Arc::new(AtomicBool::new(false));

        let thread_stop = stop.clone();
        let thread_started = Arc::clone(&started);
        let thread_running = Arc::clone(&running);
        let thread_name = name.clone();

        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }

        let thread = builder
            .spawn(move || {
                let _running = RunningGuard::enter(thread_running);
                thread_started.publish(thread::current().id());
                tracing::info!(worker = %thread_name, "worker started");

                worker.run(&thread_stop);

                tracing::info!(worker = %thread_name, "worker stopped");
            })
            .map_err(|source| WorkerLaunchError {
                name: name.clone(),
                source,
            })?;

        Ok(WorkerHandle {
            name,
            control,
            stop,
            started,
            running,
            thread: Some(thread),
        })
    }
}

/// Keeps the running flag accurate even if `run` unwinds.
struct RunningGuard(Arc<AtomicBool>);

impl RunningGuard {
    fn enter(flag: Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owned handle to a running worker.
///
/// Dropping the handle stops the worker and joins its thread.
pub struct WorkerHandle<C> {
    name: String,
    control: C,
    stop: StopSignal,
    started: Arc<AsyncResourceSlot<ThreadId>>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl<C> WorkerHandle<C> {
    /// Returns the worker's thread name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the control link captured before the worker was moved.
    #[must_use]
    pub fn control(&self) -> &C {
        &self.control
    }

    /// Returns the worker thread's id once it has started.
    #[must_use]
    pub fn thread_id(&self) -> Option<ThreadId> {
        self.started.try_get()
    }

    /// Returns whether the worker is inside `run` right now.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Waits up to `timeout` for the worker thread to enter `run`.
    ///
    /// Returns `true` if the worker started and has not yet returned.
    #[must_use]
    pub fn wait_until_running(&self, timeout: Duration) -> bool {
        self.started.await_value_timeout(timeout).is_some() && self.is_running()
    }

    /// Asks the worker to stop. Does not wait.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Stops the worker and waits for its thread to finish.
    pub fn join(mut self) -> WorkerExit {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> WorkerExit {
        self.stop.stop();
        let Some(thread) = self.thread.take() else {
            return WorkerExit::Completed;
        };
        match thread.join() {
            Ok(()) => WorkerExit::Completed,
            Err(_) => {
                tracing::error!(worker = %self.name, "worker panicked");
                WorkerExit::Panicked
            }
        }
    }
}

impl<C> fmt::Debug for WorkerHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl<C> Drop for WorkerHandle<C> {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    /// Counts loop iterations until stopped.
    struct TickWorker {
        ticks: Arc<AtomicUsize>,
    }

    impl Worker for TickWorker {
        type Control = Arc<AtomicUsize>;

        fn name(&self) -> &str {
            "tick-worker"
        }

        fn control(&self) -> Self::Control {
            Arc::clone(&self.ticks)
        }

        fn run(&mut self, stop: &StopSignal) {
            while !stop.wait_timeout(Duration::from_millis(1)) {
                self.ticks.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    struct PanicWorker;

    impl Worker for PanicWorker {
        type Control = ();

        fn name(&self) -> &str {
            "panic-worker"
        }

        fn control(&self) -> Self::Control {}

        fn run(&mut self, _stop: &StopSignal) {
            panic!("worker blew up");
        }
    }

    fn tick_worker() -> TickWorker {
        TickWorker {
            ticks: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[test]
    fn test_start_returns_running_handle() {
        let handle = WorkerLauncher::new().start(tick_worker()).unwrap();

        assert!(handle.wait_until_running(Duration::from_secs(2)));
        assert_eq!(handle.name(), "tick-worker");
        assert_ne!(handle.thread_id(), Some(thread::current().id()));

        assert_eq!(handle.join(), WorkerExit::Completed);
    }

    #[test]
    fn test_control_link_shared_with_worker() {
        let handle = WorkerLauncher::new().start(tick_worker()).unwrap();
        assert!(handle.wait_until_running(Duration::from_secs(2)));

        let deadline = Instant::now() + Duration::from_secs(2);
        while handle.control().load(Ordering::Relaxed) == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(handle.control().load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn test_stop_ends_worker() {
        let handle = WorkerLauncher::new().start(tick_worker()).unwrap();
        assert!(handle.wait_until_running(Duration::from_secs(2)));

        handle.stop();
        let deadline = Instant::now() + Duration::from_secs(2);
        while handle.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(!handle.is_running());
    }

    #[test]
    fn test_panicking_worker_reported_at_join() {
        let handle = WorkerLauncher::new().start(PanicWorker).unwrap();
        assert_eq!(handle.join(), WorkerExit::Panicked);
    }

    #[test]
    fn test_stop_signal_wait_wakes_early() {
        let signal = StopSignal::new();
        let remote = signal.clone();

        let waker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            remote.stop();
        });

        let start = Instant::now();
        assert!(signal.wait_timeout(Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_secs(5));
        waker.join().unwrap();
    }

    #[test]
    fn test_stop_signal_wait_times_out() {
        let signal = StopSignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(5)));
        assert!(!signal.is_stopped());
    }
}

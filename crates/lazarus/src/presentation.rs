//! # Presentation Launch
//!
//! The window has to be built on the UI thread, and the UI thread gives no
//! completion callback. The launcher schedules construction there and
//! publishes the result into an [`AsyncResourceSlot`] the caller waits on.
//!
//! ```text
//!   Main thread                     UI thread
//!     │                                │
//!     │ launch(slot, factory) ──task──>│ (queued)
//!     │ <── returns immediately        │
//!     │ ...controller, level...        │ surface = factory()
//!     │ slot.await_value() ...blocks   │ slot.publish(surface)
//!     │ <──────────────────────────────┘
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender};
use lazarus_config::WindowSettings;
use lazarus_core::AsyncResourceSlot;

use crate::error::PresentationError;

/// A no-argument task queued for the UI thread.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// The platform's UI-construction context.
///
/// Accepts a task and guarantees it eventually runs on whatever thread the
/// presentation layer requires. No completion signal is given back.
pub trait UiContext {
    /// Queues `task` to run on the UI thread.
    ///
    /// # Errors
    ///
    /// Returns [`PresentationError::ContextClosed`] if the context has shut down.
    fn invoke_later(&self, task: UiTask) -> Result<(), PresentationError>;
}

/// A dedicated UI thread running queued tasks in FIFO order.
///
/// Dropping the handle closes the queue without waiting: a task stuck on the
/// UI thread must not hold up an aborting process. Use
/// [`shutdown`](Self::shutdown) to wait for the queue to drain.
pub struct UiThread {
    sender: Option<Sender<UiTask>>,
    thread: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

impl UiThread {
    /// Starts the UI thread.
    ///
    /// # Errors
    ///
    /// Returns [`PresentationError::Spawn`] if the thread cannot be started.
    pub fn spawn(name: &str) -> Result<Self, PresentationError> {
        let (sender, receiver) = crossbeam_channel::unbounded::<UiTask>();

        let thread = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || Self::dispatch_loop(&receiver))
            .map_err(PresentationError::Spawn)?;
        let thread_id = thread.thread().id();

        tracing::debug!(thread = name, "UI thread started");

        Ok(Self {
            sender: Some(sender),
            thread: Some(thread),
            thread_id,
        })
    }

    fn dispatch_loop(receiver: &Receiver<UiTask>) {
        // Ends once every sender is gone
        for task in receiver {
            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                tracing::error!("UI task panicked");
            }
        }
    }

    /// Id of the UI thread.
    #[must_use]
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Returns whether the calling thread is the UI thread.
    #[must_use]
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Runs the remaining queued tasks, then stops the thread.
    pub fn shutdown(mut self) {
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("UI thread panicked");
            }
        }
    }
}

impl UiContext for UiThread {
    fn invoke_later(&self, task: UiTask) -> Result<(), PresentationError> {
        let sender = self.sender.as_ref().ok_or(PresentationError::ContextClosed)?;
        sender
            .send(task)
            .map_err(|_| PresentationError::ContextClosed)
    }
}

impl fmt::Debug for UiThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiThread")
            .field("thread_id", &self.thread_id)
            .field("open", &self.sender.is_some())
            .finish()
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        // Closing the queue ends the dispatch loop once the current task returns
        self.sender.take();
        if self.thread.take().is_some() {
            tracing::debug!("UI thread detached");
        }
    }
}

/// Schedules presentation surface construction on a [`UiContext`].
pub struct PresentationLauncher<'a, U: ?Sized> {
    ui: &'a U,
}

impl<'a, U: UiContext + ?Sized> PresentationLauncher<'a, U> {
    /// Creates a launcher for `ui`.
    pub fn new(ui: &'a U) -> Self {
        Self { ui }
    }

    /// Queues `factory` on the UI thread and publishes its result into `slot`.
    ///
    /// Returns without waiting for construction. The factory runs exactly
    /// once and the publish is the last thing the task does.
    ///
    /// # Errors
    ///
    /// Returns [`PresentationError`] if the UI context refuses the task.
    pub fn launch<S, F>(
        &self,
        slot: Arc<AsyncResourceSlot<S>>,
        factory: F,
    ) -> Result<(), PresentationError>
    where
        S: Send + 'static,
        F: FnOnce() -> S + Send + 'static,
    {
        self.ui.invoke_later(Box::new(move || {
            let surface = factory();
            slot.publish(surface);
        }))
    }
}

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to the window the game draws into.
#[derive(Debug)]
pub struct WindowSurface {
    id: u64,
    title: String,
    width: u32,
    height: u32,
    created_on: ThreadId,
}

impl WindowSurface {
    /// Creates the window. Call this on the UI thread.
    #[must_use]
    pub fn create(settings: &WindowSettings) -> Self {
        let surface = Self {
            id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            title: settings.title.clone(),
            width: settings.width,
            height: settings.height,
            created_on: thread::current().id(),
        };
        tracing::info!(
            title = %surface.title,
            width = surface.width,
            height = surface.height,
            "window created"
        );
        surface
    }

    /// Process-unique surface id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Window title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Size in pixels, `(width, height)`.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The thread that constructed the surface.
    #[must_use]
    pub fn created_on(&self) -> ThreadId {
        self.created_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_tasks_run_on_ui_thread_in_order() {
        let ui = UiThread::spawn("test-ui").unwrap();
        let ui_id = ui.thread_id();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = Arc::clone(&order);
            ui.invoke_later(Box::new(move || {
                assert_eq!(thread::current().id(), ui_id);
                order.lock().push(i);
            }))
            .unwrap();
        }

        ui.shutdown();
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_launch_builds_surface_on_ui_thread() {
        let ui = UiThread::spawn("test-ui").unwrap();
        let slot = Arc::new(AsyncResourceSlot::new());
        let settings = WindowSettings::default();

        PresentationLauncher::new(&ui)
            .launch(Arc::clone(&slot), move || Arc::new(WindowSurface::create(&settings)))
            .unwrap();

        let surface = slot.await_value_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(surface.created_on(), ui.thread_id());
        assert_ne!(surface.created_on(), thread::current().id());
        assert_eq!(surface.size(), (1280, 720));
        assert!(!ui.is_ui_thread());
    }

    #[test]
    fn test_factory_runs_exactly_once() {
        let ui = UiThread::spawn("test-ui").unwrap();
        let slot = Arc::new(AsyncResourceSlot::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let counted = Arc::clone(&calls);
        PresentationLauncher::new(&ui)
            .launch(Arc::clone(&slot), move || counted.fetch_add(1, Ordering::SeqCst))
            .unwrap();

        ui.shutdown();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(slot.try_get(), Some(0));
    }

    #[test]
    fn test_panicking_task_does_not_kill_ui_thread() {
        let ui = UiThread::spawn("test-ui").unwrap();
        let slot = Arc::new(AsyncResourceSlot::new());

        ui.invoke_later(Box::new(|| panic!("bad task"))).unwrap();
        PresentationLauncher::new(&ui)
            .launch(Arc::clone(&slot), || 5_u8)
            .unwrap();

        assert_eq!(slot.await_value_timeout(Duration::from_secs(5)), Some(5));
    }

    #[test]
    fn test_drop_does_not_wait_for_stuck_task() {
        let ui = UiThread::spawn("test-ui").unwrap();
        let (started_tx, started_rx) = crossbeam_channel::bounded(1);

        ui.invoke_later(Box::new(move || {
            started_tx.send(()).unwrap();
            thread::sleep(Duration::from_secs(3));
        }))
        .unwrap();
        started_rx.recv_timeout(Duration::from_secs(2)).unwrap();

        let start = std::time::Instant::now();
        drop(ui);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_invoke_after_shutdown_requested_is_refused() {
        let mut ui = UiThread::spawn("test-ui").unwrap();
        ui.sender.take();

        let err = ui.invoke_later(Box::new(|| {})).unwrap_err();
        assert!(matches!(err, PresentationError::ContextClosed));
    }

    #[test]
    fn test_surface_ids_are_unique() {
        let settings = WindowSettings::default();
        let a = WindowSurface::create(&settings);
        let b = WindowSurface::create(&settings);
        assert_ne!(a.id(), b.id());
    }
}

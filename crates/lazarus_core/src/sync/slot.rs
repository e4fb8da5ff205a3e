//! # Async Resource Slot
//!
//! Single-assignment, cross-thread handoff of one value.
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────────────────────────┐
//!        │        AsyncResourceSlot<T>      │
//!        │                                  │
//!        │  ┌────────────────────────────┐  │
//!        │  │ Mutex<Option<T>>           │  │
//!        │  │   None ──publish──> Some(v)│  │
//!        │  └────────────────────────────┘  │
//!        │  ┌────────────────────────────┐  │
//!        │  │ Condvar (published)        │  │
//!        │  └────────────────────────────┘  │
//!        └──────────────────────────────────┘
//!            ▲                        │
//!     publish (once)            await_value (many)
//!      any thread                  any thread
//! ```
//!
//! ## Thread Safety
//!
//! - `publish`: stores under the lock, then wakes every waiter
//! - `await_value`: checks under the lock and waits on the condvar, which
//!   releases the lock while parked; spurious wakeups re-check and park again
//! - The stored value is never cleared or replaced

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::SlotError;

/// A value written at most once by one thread and awaited by others.
///
/// Share it as `Arc<AsyncResourceSlot<T>>`. Waiters receive a clone of the
/// stored value, so `T` is usually a cheap handle such as an `Arc`.
///
/// ## Usage
///
/// ```rust,ignore
/// let slot = Arc::new(AsyncResourceSlot::new());
///
/// let ui_slot = Arc::clone(&slot);
/// ui.invoke_later(move || ui_slot.publish(Arc::new(create_window())));
///
/// // Blocks until the UI thread has published.
/// let window = slot.await_value();
/// ```
pub struct AsyncResourceSlot<T> {
    /// The published value. `None` until `publish` succeeds.
    value: Mutex<Option<T>>,
    /// Signalled once, after the value is stored.
    published: Condvar,
}

impl<T> AsyncResourceSlot<T> {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            published: Condvar::new(),
        }
    }

    /// Stores `value` and wakes every waiter.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::AlreadyPublished`] with the rejected value if the
    /// slot already holds one. The stored value is left untouched.
    pub fn try_publish(&self, value: T) -> Result<(), SlotError<T>> {
        let mut guard = self.value.lock();
        if guard.is_some() {
            return Err(SlotError::AlreadyPublished(value));
        }
        *guard = Some(value);
        drop(guard);

        self.published.notify_all();
        Ok(())
    }

    /// Stores `value` and wakes every waiter.
    ///
    /// # Panics
    ///
    /// Panics if the slot was already published. A second publish means the
    /// publisher broke the single-assignment contract other threads rely on.
    #[track_caller]
    pub fn publish(&self, value: T) {
        if let Err(err) = self.try_publish(value) {
            panic!("{err}");
        }
    }

    /// Returns whether a value has been published.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.value.lock().is_some()
    }
}

impl<T: Clone> AsyncResourceSlot<T> {
    /// Returns the published value without blocking.
    #[must_use]
    pub fn try_get(&self) -> Option<T> {
        self.value.lock().clone()
    }

    /// Blocks until a value is published, then returns it.
    ///
    /// Returns immediately if the value is already there. Never returns
    /// without a value: spurious wakeups go back to waiting.
    #[must_use]
    pub fn await_value(&self) -> T {
        let mut guard = self.value.lock();
        loop {
            if let Some(value) = guard.as_ref() {
                return value.clone();
            }
            self.published.wait(&mut guard);
        }
    }

    /// Like [`await_value`](Self::await_value), but gives up after `timeout`.
    ///
    /// Returns `None` if nothing was published in time.
    #[must_use]
    pub fn await_value_timeout(&self, timeout: Duration) -> Option<T> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Some(self.await_value());
        };

        let mut guard = self.value.lock();
        loop {
            if let Some(value) = guard.as_ref() {
                return Some(value.clone());
            }
            if self.published.wait_until(&mut guard, deadline).timed_out() {
                return guard.clone();
            }
        }
    }
}

impl<T> Default for AsyncResourceSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for AsyncResourceSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResourceSlot")
            .field("published", &self.is_published())
            .finish()
    }
}

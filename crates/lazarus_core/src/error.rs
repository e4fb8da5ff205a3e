//! # Core Error Types
//!
//! Errors raised by the slot and the worker launcher.

use std::fmt;

use thiserror::Error;

/// Errors raised by [`AsyncResourceSlot`](crate::AsyncResourceSlot).
#[derive(Error)]
pub enum SlotError<T> {
    /// `publish` was called on a slot that already holds a value.
    ///
    /// Carries the rejected value back to the caller; the stored value is untouched.
    #[error("slot already published: a single-assignment value cannot be replaced")]
    AlreadyPublished(T),
}

impl<T> SlotError<T> {
    /// Returns the value that was rejected.
    pub fn into_inner(self) -> T {
        match self {
            Self::AlreadyPublished(value) => value,
        }
    }
}

impl<T> fmt::Debug for SlotError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyPublished(_) => f.write_str("AlreadyPublished(..)"),
        }
    }
}

/// The operating system refused to start a worker thread.
#[derive(Error, Debug)]
#[error("failed to start worker thread `{name}`: {source}")]
pub struct WorkerLaunchError {
    /// Name of the worker that could not be started.
    pub name: String,
    /// Underlying spawn failure.
    #[source]
    pub source: std::io::Error,
}

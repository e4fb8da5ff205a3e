//! # LAZARUS Core
//!
//! Cross-thread primitives the startup sequence is built on:
//! - [`AsyncResourceSlot`]: single-assignment handoff of one value between threads
//! - [`WorkerLauncher`]: starts a long-running [`Worker`] on its own named thread
//!   and returns an owned [`WorkerHandle`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lazarus_core::AsyncResourceSlot;
//!
//! let slot = Arc::new(AsyncResourceSlot::new());
//! let publisher = Arc::clone(&slot);
//! std::thread::spawn(move || publisher.publish(42_u32));
//! assert_eq!(slot.await_value(), 42);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod sync;
pub mod worker;

pub use error::{SlotError, WorkerLaunchError};
pub use sync::AsyncResourceSlot;
pub use worker::{StopSignal, Worker, WorkerExit, WorkerHandle, WorkerLauncher};

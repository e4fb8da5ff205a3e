//! # Synchronization Primitives for Startup
//!
//! ## The Problem
//!
//! ```text
//! Main thread:  needs the window to wire it into the game
//! UI thread:    creates the window "eventually"
//!
//! Check-then-wait without a shared lock: LOST WAKEUP → HANG
//! ```
//!
//! ## The Solution: A Single-Assignment Slot
//!
//! ```text
//! UI thread:    lock → store → unlock → notify_all
//! Main thread:  lock → stored? return : wait (releases lock) → re-check
//! ```
//!
//! The emptiness check and the store happen under the same mutex, so a
//! publish that lands before the waiter arrives is always observed.

mod slot;

pub use slot::AsyncResourceSlot;

//! # LAZARUS
//!
//! Startup orchestration for the game: brings the window, the level, the
//! simulation controller and the audio thread up in dependency order, then
//! hands the main thread to the controller.
//!
//! ## Threads
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  MAIN THREAD              UI THREAD              AUDIO THREAD     │
//! │                                                                  │
//! │  launch window ──task──>  build window                           │
//! │  build controller              │                                 │
//! │  load level                    │                                 │
//! │  await window  <──publish──────┘                                 │
//! │  start audio   ───────────────────────────────>  run loop        │
//! │  transfer_control (frame loop) ──commands──────>  cues           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `bootstrap`: the startup state machine
//! - `presentation`: UI thread and window launch
//! - `audio`: the audio worker
//! - `controller`: the simulation controller contract and default game loop
//! - `logging`: subscriber setup for binaries

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod audio;
pub mod bootstrap;
pub mod controller;
pub mod error;
pub mod logging;
pub mod presentation;

// Re-export the supporting crates
pub use lazarus_config as config;
pub use lazarus_core as core;

// Re-export commonly used types
pub use audio::{SoundCommand, SoundControl, SoundCue, SoundStats, SoundWorker};
pub use bootstrap::{run_game, StartupCoordinator, StartupPhase};
pub use controller::{GameController, SimulationController};
pub use error::{PresentationError, StartupError, StartupResult};
pub use presentation::{PresentationLauncher, UiContext, UiTask, UiThread, WindowSurface};

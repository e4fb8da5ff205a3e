//! # Startup Error Types
//!
//! Every error here is fatal to startup: control is never transferred after one.

use std::time::Duration;

use lazarus_config::ConfigLoadError;
use lazarus_core::WorkerLaunchError;
use thiserror::Error;

/// Errors from the UI dispatch context.
#[derive(Error, Debug)]
pub enum PresentationError {
    /// The UI context no longer accepts tasks.
    #[error("UI context is closed, task was not scheduled")]
    ContextClosed,

    /// The UI thread could not be started.
    #[error("failed to start UI thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Errors that abort the startup sequence.
#[derive(Error, Debug)]
pub enum StartupError {
    /// Settings or level description missing or malformed.
    #[error("configuration failed to load: {0}")]
    Config(#[from] ConfigLoadError),

    /// The presentation surface could not be scheduled.
    #[error("presentation launch failed: {0}")]
    Presentation(#[from] PresentationError),

    /// The audio worker thread could not be started.
    #[error(transparent)]
    WorkerLaunch(#[from] WorkerLaunchError),

    /// The UI thread never published the presentation surface.
    #[error("presentation surface not published within {waited:?}")]
    SurfaceTimeout {
        /// How long startup waited.
        waited: Duration,
    },
}

/// Result type for startup operations.
pub type StartupResult<T> = Result<T, StartupError>;

//! # Startup Coordinator
//!
//! THE BOOT SEQUENCE:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. PRESENTATION_LAUNCHED                                            │
//! │    └─ Queue window construction on the UI thread (returns at once)  │
//! │                                                                     │
//! │ 2. CONTROLLER_READY                                                 │
//! │    └─ Build the simulation controller (UI thread may still be busy) │
//! │                                                                     │
//! │ 3. CONFIG_LOADED                                                    │
//! │    └─ Load the level synchronously, bind it                         │
//! │                                                                     │
//! │ 4. SURFACE_WIRED                                                    │
//! │    └─ BLOCK until the UI thread publishes the window, bind it       │
//! │                                                                     │
//! │ 5. WORKER_WIRED                                                     │
//! │    └─ Start the audio thread, bind its handle                       │
//! │                                                                     │
//! │ 6. CONTROL_TRANSFERRED                                              │
//! │    └─ controller.transfer_control() ── rest of the process          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error in steps 1-5 returns before step 6. The controller is dropped
//! half-wired and never gets control.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lazarus_config::{ConfigLoader, LevelConfig, StartupSettings, TomlLevelLoader};
use lazarus_core::{AsyncResourceSlot, Worker, WorkerLauncher};

use crate::audio::SoundWorker;
use crate::controller::{GameController, SimulationController};
use crate::error::{StartupError, StartupResult};
use crate::presentation::{PresentationLauncher, UiContext, WindowSurface};

/// Phases of the boot sequence, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StartupPhase {
    /// Nothing started yet.
    Init,
    /// Window construction queued on the UI thread.
    PresentationLaunched,
    /// Simulation controller built.
    ControllerReady,
    /// Level loaded and bound.
    ConfigLoaded,
    /// Window published and bound.
    SurfaceWired,
    /// Audio worker started and bound.
    WorkerWired,
    /// Controller has control.
    ControlTransferred,
}

impl StartupPhase {
    /// Upper-case phase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::PresentationLaunched => "PRESENTATION_LAUNCHED",
            Self::ControllerReady => "CONTROLLER_READY",
            Self::ConfigLoaded => "CONFIG_LOADED",
            Self::SurfaceWired => "SURFACE_WIRED",
            Self::WorkerWired => "WORKER_WIRED",
            Self::ControlTransferred => "CONTROL_TRANSFERRED",
        }
    }
}

impl fmt::Display for StartupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs the one-shot boot sequence.
///
/// ## Usage
///
/// ```rust,ignore
/// let ui = UiThread::spawn("lazarus-ui")?;
/// let mut coordinator = StartupCoordinator::new(&ui, TomlLevelLoader, "config/level.toml");
///
/// let controller = coordinator.run(
///     move || Arc::new(WindowSurface::create(&window)),
///     move || GameController::new(simulation),
///     move || SoundWorker::new(&audio),
/// )?;
/// ```
pub struct StartupCoordinator<'a, U: ?Sized, L> {
    ui: &'a U,
    loader: L,
    level_source: String,
    surface_timeout: Option<Duration>,
    launcher: WorkerLauncher,
    phase: StartupPhase,
}

impl<'a, U, L> StartupCoordinator<'a, U, L>
where
    U: UiContext + ?Sized,
    L: ConfigLoader,
{
    /// Creates a coordinator that waits indefinitely for the window.
    pub fn new(ui: &'a U, loader: L, level_source: impl Into<String>) -> Self {
        Self {
            ui,
            loader,
            level_source: level_source.into(),
            surface_timeout: None,
            launcher: WorkerLauncher::new(),
            phase: StartupPhase::Init,
        }
    }

    /// Creates a coordinator from the level source and surface timeout in `settings`.
    pub fn from_settings(ui: &'a U, loader: L, settings: &StartupSettings) -> Self {
        Self::new(ui, loader, settings.level.clone())
            .with_surface_timeout(settings.surface_timeout())
    }

    /// Bounds the wait for the window. `None` waits indefinitely.
    #[must_use]
    pub fn with_surface_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.surface_timeout = timeout;
        self
    }

    /// Uses `launcher` to start the worker.
    #[must_use]
    pub fn with_worker_launcher(mut self, launcher: WorkerLauncher) -> Self {
        self.launcher = launcher;
        self
    }

    /// The last phase reached.
    #[must_use]
    pub fn phase(&self) -> StartupPhase {
        self.phase
    }

    /// Runs the boot sequence and hands control to the controller.
    ///
    /// `make_surface` runs on the UI thread; the other factories run on the
    /// calling thread. Returns the controller once `transfer_control` returns.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] if any step before control transfer fails.
    /// `transfer_control` is not called in that case.
    ///
    /// # Panics
    ///
    /// Panics if called more than once; startup is one-shot.
    pub fn run<C, S, W, FS, FC, FW>(
        &mut self,
        make_surface: FS,
        make_controller: FC,
        make_worker: FW,
    ) -> StartupResult<C>
    where
        C: SimulationController<Surface = S, WorkerControl = W::Control>,
        S: Clone + Send + 'static,
        W: Worker,
        FS: FnOnce() -> S + Send + 'static,
        FC: FnOnce() -> C,
        FW: FnOnce() -> W,
    {
        assert_eq!(self.phase, StartupPhase::Init, "startup sequence already ran");
        tracing::info!(level = %self.level_source, "startup begins");

        let slot = Arc::new(AsyncResourceSlot::new());
        PresentationLauncher::new(self.ui).launch(Arc::clone(&slot), make_surface)?;
        self.advance(StartupPhase::PresentationLaunched);

        let mut controller = make_controller();
        self.advance(StartupPhase::ControllerReady);

        let level = self.load_level()?;
        controller.bind_configuration(level);
        self.advance(StartupPhase::ConfigLoaded);

        let surface = self.await_surface(&slot)?;
        controller.bind_presentation_surface(surface);
        self.advance(StartupPhase::SurfaceWired);

        let handle = self.launcher.start(make_worker())?;
        controller.bind_worker_handle(handle);
        self.advance(StartupPhase::WorkerWired);

        self.advance(StartupPhase::ControlTransferred);
        controller.transfer_control();

        Ok(controller)
    }

    fn advance(&mut self, next: StartupPhase) {
        debug_assert!(next > self.phase, "phases only move forward");
        tracing::info!(from = %self.phase, to = %next, "startup phase");
        self.phase = next;
    }

    fn load_level(&self) -> StartupResult<LevelConfig> {
        self.loader.load(&self.level_source).map_err(|err| {
            tracing::error!(source = %self.level_source, %err, "level failed to load");
            StartupError::from(err)
        })
    }

    fn await_surface<S: Clone>(&self, slot: &AsyncResourceSlot<S>) -> StartupResult<S> {
        tracing::debug!(timeout = ?self.surface_timeout, "waiting for presentation surface");
        let start = Instant::now();

        let surface = match self.surface_timeout {
            None => slot.await_value(),
            Some(timeout) => slot
                .await_value_timeout(timeout)
                .ok_or(StartupError::SurfaceTimeout { waited: timeout })?,
        };

        tracing::debug!(waited = ?start.elapsed(), "presentation surface ready");
        Ok(surface)
    }
}

/// Boots the game with the default subsystems and runs it to completion.
///
/// # Errors
///
/// Returns [`StartupError`] if any startup step fails.
pub fn run_game<U: UiContext + ?Sized>(
    ui: &U,
    settings: &StartupSettings,
) -> StartupResult<GameController> {
    let window = settings.window.clone();
    let simulation = settings.simulation.clone();
    let audio = settings.audio.clone();

    StartupCoordinator::from_settings(ui, TomlLevelLoader, settings).run(
        move || Arc::new(WindowSurface::create(&window)),
        move || GameController::new(simulation),
        move || SoundWorker::new(&audio),
    )
}

//! # Simulation Controller
//!
//! The long-lived object that owns the running game. Startup wires three
//! dependencies into it and only then hands it control:
//!
//! ```text
//!   bind_configuration(level)          ─┐
//!   bind_presentation_surface(window)  ─┼─> transfer_control() ── runs until shutdown
//!   bind_worker_handle(audio)          ─┘
//! ```

use std::sync::Arc;
use std::time::Instant;

use lazarus_config::{LevelConfig, SimulationSettings};
use lazarus_core::{StopSignal, WorkerExit, WorkerHandle};

use crate::audio::{SoundControl, SoundCue};
use crate::presentation::WindowSurface;

/// Contract between the startup sequence and the running application.
pub trait SimulationController {
    /// The presentation surface type.
    type Surface;
    /// Control link of the worker bound into the controller.
    type WorkerControl;

    /// Wires in the window.
    fn bind_presentation_surface(&mut self, surface: Self::Surface);

    /// Wires in the level description.
    fn bind_configuration(&mut self, config: LevelConfig);

    /// Wires in the audio worker.
    fn bind_worker_handle(&mut self, handle: WorkerHandle<Self::WorkerControl>);

    /// Takes over the calling thread for the rest of the application's life.
    ///
    /// Only called after all three `bind_*` calls have completed.
    fn transfer_control(&mut self);
}

/// Default controller: a fixed-timestep frame loop over the bound subsystems.
pub struct GameController {
    settings: SimulationSettings,
    surface: Option<Arc<WindowSurface>>,
    level: Option<LevelConfig>,
    audio: Option<WorkerHandle<SoundControl>>,
    stop: StopSignal,
    frames_run: u64,
    audio_exit: Option<WorkerExit>,
}

impl GameController {
    /// Creates a controller with nothing bound.
    #[must_use]
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            settings,
            surface: None,
            level: None,
            audio: None,
            stop: StopSignal::new(),
            frames_run: 0,
            audio_exit: None,
        }
    }

    /// Signal that ends the frame loop when raised.
    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Returns whether all three dependencies are wired in.
    #[must_use]
    pub fn is_fully_bound(&self) -> bool {
        self.surface.is_some() && self.level.is_some() && self.audio.is_some()
    }

    /// The bound window, if any.
    #[must_use]
    pub fn surface(&self) -> Option<&Arc<WindowSurface>> {
        self.surface.as_ref()
    }

    /// The bound level, if any.
    #[must_use]
    pub fn level(&self) -> Option<&LevelConfig> {
        self.level.as_ref()
    }

    /// Frames executed by the last `transfer_control`.
    #[must_use]
    pub fn frames_run(&self) -> u64 {
        self.frames_run
    }

    /// How the audio worker ended, once control has been returned.
    #[must_use]
    pub fn audio_exit(&self) -> Option<WorkerExit> {
        self.audio_exit
    }

    fn frame_limit_reached(&self) -> bool {
        self.settings.frame_limit.is_some_and(|limit| self.frames_run >= limit)
    }
}

impl SimulationController for GameController {
    type Surface = Arc<WindowSurface>;
    type WorkerControl = SoundControl;

    fn bind_presentation_surface(&mut self, surface: Self::Surface) {
        tracing::debug!(surface = surface.id(), "surface bound");
        self.surface = Some(surface);
    }

    fn bind_configuration(&mut self, config: LevelConfig) {
        tracing::debug!(level = %config.name, "level bound");
        self.level = Some(config);
    }

    fn bind_worker_handle(&mut self, handle: WorkerHandle<Self::WorkerControl>) {
        tracing::debug!(worker = handle.name(), "audio worker bound");
        self.audio = Some(handle);
    }

    /// Runs frames until the frame limit or a stop request, then stops audio.
    ///
    /// # Panics
    ///
    /// Panics if any dependency is missing.
    fn transfer_control(&mut self) {
        assert!(
            self.is_fully_bound(),
            "transfer_control called before surface, level and audio were all bound"
        );
        let Some(audio) = self.audio.take() else {
            return;
        };

        if let (Some(surface), Some(level)) = (&self.surface, &self.level) {
            tracing::info!(
                window = %surface.title(),
                level = %level.name,
                fps = self.settings.target_fps,
                "game has control"
            );
        }

        let frame_time = self.settings.frame_time();
        let ambient_every = u64::from(self.settings.target_fps.max(1));
        let mut next_frame = Instant::now();

        while !self.stop.is_stopped() && !self.frame_limit_reached() {
            if self.frames_run % ambient_every == 0 {
                audio.control().play(SoundCue::Ambient);
            }
            self.frames_run += 1;

            next_frame += frame_time;
            let now = Instant::now();
            if next_frame > now {
                self.stop.wait_timeout(next_frame - now);
            } else {
                // Behind schedule: don't try to catch up
                next_frame = now;
            }
        }

        tracing::info!(frames = self.frames_run, "game loop finished");
        self.audio_exit = Some(audio.join());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SoundWorker;
    use lazarus_config::{AudioSettings, MapConfig, PlayerConfig, WindowSettings, ZombieConfig};
    use lazarus_core::WorkerLauncher;
    use std::thread;
    use std::time::Duration;

    fn level() -> LevelConfig {
        LevelConfig {
            name: String::from("Test House"),
            map: MapConfig {
                width: 8,
                height: 8,
                tile_size: 1.0,
            },
            player: PlayerConfig::default(),
            zombies: ZombieConfig::default(),
        }
    }

    fn bound_controller(settings: SimulationSettings) -> GameController {
        let mut controller = GameController::new(settings);
        controller.bind_configuration(level());
        let surface = WindowSurface::create(&WindowSettings::default());
        controller.bind_presentation_surface(Arc::new(surface));
        let audio = WorkerLauncher::new()
            .start(SoundWorker::new(&AudioSettings::default()))
            .unwrap();
        controller.bind_worker_handle(audio);
        controller
    }

    #[test]
    fn test_new_controller_is_unbound() {
        let controller = GameController::new(SimulationSettings::default());
        assert!(!controller.is_fully_bound());
        assert!(controller.surface().is_none());
        assert!(controller.level().is_none());
    }

    #[test]
    fn test_runs_to_frame_limit_and_stops_audio() {
        let mut controller = bound_controller(SimulationSettings {
            target_fps: 1000,
            frame_limit: Some(25),
        });
        assert!(controller.is_fully_bound());

        controller.transfer_control();

        assert_eq!(controller.frames_run(), 25);
        assert_eq!(controller.audio_exit(), Some(WorkerExit::Completed));
    }

    #[test]
    fn test_stop_signal_ends_loop() {
        let mut controller = bound_controller(SimulationSettings {
            target_fps: 100,
            frame_limit: None,
        });
        let stop = controller.stop_signal();

        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            stop.stop();
        });

        controller.transfer_control();
        stopper.join().unwrap();

        assert!(controller.frames_run() > 0);
        assert_eq!(controller.audio_exit(), Some(WorkerExit::Completed));
    }

    #[test]
    #[should_panic(expected = "transfer_control called before")]
    fn test_transfer_without_dependencies_panics() {
        let mut controller = GameController::new(SimulationSettings::default());
        controller.bind_configuration(level());
        controller.transfer_control(); // Should panic
    }
}

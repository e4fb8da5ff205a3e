//! # Startup Settings
//!
//! Process-wide settings read once, before any subsystem starts.
//!
//! ```toml
//! level = "config/level.toml"
//! surface_timeout_ms = 10000   # omit to wait for the window indefinitely
//!
//! [window]
//! title = "LAZARUS"
//! width = 1280
//! height = 720
//!
//! [audio]
//! master_volume = 0.8
//! queue_capacity = 64
//! idle_poll_ms = 10
//!
//! [simulation]
//! target_fps = 60
//! frame_limit = 600            # omit to run until stopped
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigLoadError, ConfigResult};

/// Default level description path.
pub const DEFAULT_LEVEL_SOURCE: &str = "config/level.toml";

/// Settings for the presentation surface.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSettings {
    /// Window title.
    pub title: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: String::from("LAZARUS"),
            width: 1280,
            height: 720,
        }
    }
}

/// Settings for the audio worker.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioSettings {
    /// Master volume, 0.0 to 1.0.
    pub master_volume: f32,
    /// Capacity of the command queue feeding the audio thread.
    pub queue_capacity: usize,
    /// How long the audio thread idles between stop checks (ms).
    pub idle_poll_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            queue_capacity: 64,
            idle_poll_ms: 10,
        }
    }
}

impl AudioSettings {
    /// Idle poll interval as a [`Duration`].
    #[must_use]
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }
}

/// Settings for the simulation frame loop.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    /// Target frames per second.
    pub target_fps: u32,
    /// Stop after this many frames. `None` runs until stopped.
    pub frame_limit: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            target_fps: 60,
            frame_limit: None,
        }
    }
}

impl SimulationSettings {
    /// Duration of one frame at the target rate.
    #[must_use]
    pub fn frame_time(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}

/// Top-level startup settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StartupSettings {
    /// Presentation surface settings.
    pub window: WindowSettings,
    /// Source identifier of the level description.
    pub level: String,
    /// Upper bound on the wait for the presentation surface (ms).
    ///
    /// `None` waits indefinitely.
    pub surface_timeout_ms: Option<u64>,
    /// Audio worker settings.
    pub audio: AudioSettings,
    /// Frame loop settings.
    pub simulation: SimulationSettings,
}

impl Default for StartupSettings {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            level: String::from(DEFAULT_LEVEL_SOURCE),
            surface_timeout_ms: None,
            audio: AudioSettings::default(),
            simulation: SimulationSettings::default(),
        }
    }
}

impl StartupSettings {
    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigLoadError`] if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&text, path)?;
        tracing::info!(path = %path.display(), "loaded startup settings");
        Ok(settings)
    }

    /// Loads settings from `path` if given, defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigLoadError`] if a path is given and loading fails.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                tracing::info!("no settings file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parses and validates settings. `origin` names the source in errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigLoadError::Parse`] or [`ConfigLoadError::Invalid`].
    pub fn from_toml_str(text: &str, origin: impl AsRef<Path>) -> ConfigResult<Self> {
        let origin = origin.as_ref();
        let settings: Self = toml::from_str(text).map_err(|source| ConfigLoadError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        settings.validate().map_err(|reason| ConfigLoadError::Invalid {
            path: origin.to_path_buf(),
            reason,
        })?;
        Ok(settings)
    }

    /// The surface wait bound, if any.
    #[must_use]
    pub fn surface_timeout(&self) -> Option<Duration> {
        self.surface_timeout_ms.map(Duration::from_millis)
    }

    fn validate(&self) -> Result<(), String> {
        if self.level.trim().is_empty() {
            return Err(String::from("level source must not be empty"));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            ));
        }
        if !(0.0..=1.0).contains(&self.audio.master_volume) {
            return Err(format!(
                "audio.master_volume must be within 0.0..=1.0, got {}",
                self.audio.master_volume
            ));
        }
        if self.audio.queue_capacity == 0 {
            return Err(String::from("audio.queue_capacity must be at least 1"));
        }
        if !(1..=1000).contains(&self.simulation.target_fps) {
            return Err(format!(
                "simulation.target_fps must be within 1..=1000, got {}",
                self.simulation.target_fps
            ));
        }
        Ok(())
    }
}

//! # LAZARUS Config
//!
//! Everything read from disk before the game takes control.
//!
//! ## Files
//!
//! ```text
//! lazarus.toml          StartupSettings  (optional, defaults otherwise)
//!   └─ level = "..."    LevelConfig      (required, loaded via ConfigLoader)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use lazarus_config::{ConfigLoader, StartupSettings, TomlLevelLoader};
//!
//! let settings = StartupSettings::load_or_default(None)?;
//! let level = TomlLevelLoader.load(&settings.level)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod level;
pub mod settings;

pub use error::{ConfigLoadError, ConfigResult};
pub use level::{ConfigLoader, LevelConfig, MapConfig, PlayerConfig, TomlLevelLoader, ZombieConfig};
pub use settings::{AudioSettings, SimulationSettings, StartupSettings, WindowSettings};

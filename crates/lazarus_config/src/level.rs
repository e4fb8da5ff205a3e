//! # Level Descriptions
//!
//! The level the simulation controller runs: map dimensions plus the tuning
//! values for the player and the zombies.
//!
//! ```toml
//! name = "Farmhouse"
//!
//! [map]
//! width = 48
//! height = 48
//! tile_size = 1.0
//!
//! [player]
//! speed = 1.0
//! hearing = 20.0
//!
//! [zombies]
//! spawn_rate = 0.01
//! decision_interval_ms = 2000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigLoadError, ConfigResult};

/// Loads a level description from a source identifier.
///
/// Called synchronously during startup. Implementations decide what the
/// identifier means (a path, an asset key, ...).
pub trait ConfigLoader {
    /// Loads and validates the level named by `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigLoadError`] if the source is missing or malformed.
    fn load(&self, source: &str) -> ConfigResult<LevelConfig>;
}

impl<L: ConfigLoader + ?Sized> ConfigLoader for &L {
    fn load(&self, source: &str) -> ConfigResult<LevelConfig> {
        (**self).load(source)
    }
}

/// Reads level descriptions from TOML files on disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct TomlLevelLoader;

impl ConfigLoader for TomlLevelLoader {
    fn load(&self, source: &str) -> ConfigResult<LevelConfig> {
        let path = Path::new(source);
        let text = std::fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
        let level = LevelConfig::from_toml_str(&text, path)?;
        tracing::info!(
            level = %level.name,
            width = level.map.width,
            height = level.map.height,
            "loaded level"
        );
        Ok(level)
    }
}

/// Map layout.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapConfig {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Edge length of one tile in world units.
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
}

fn default_tile_size() -> f32 {
    1.0
}

/// Player tuning.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Walking speed in tiles per second.
    pub speed: f32,
    /// Speed multiplier while sprinting.
    pub sprint_multiplier: f32,
    /// Distance in tiles at which zombies are heard.
    pub hearing: f32,
    /// Seconds of sprint available from full.
    pub stamina: f32,
    /// Stamina regained per second.
    pub stamina_regen: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            sprint_multiplier: 2.0,
            hearing: 20.0,
            stamina: 5.0,
            stamina_regen: 0.2,
        }
    }
}

/// Zombie tuning.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZombieConfig {
    /// Chance per tile that a zombie spawns there, 0.0 to 1.0.
    pub spawn_rate: f32,
    /// Walking speed in tiles per second.
    pub speed: f32,
    /// Distance in tiles at which a zombie smells the player.
    pub smell: f32,
    /// Time between heading decisions (ms).
    pub decision_interval_ms: u64,
}

impl Default for ZombieConfig {
    fn default() -> Self {
        Self {
            spawn_rate: 0.01,
            speed: 0.5,
            smell: 15.0,
            decision_interval_ms: 2000,
        }
    }
}

impl ZombieConfig {
    /// Decision interval as a [`Duration`].
    #[must_use]
    pub fn decision_interval(&self) -> Duration {
        Duration::from_millis(self.decision_interval_ms)
    }
}

/// A complete level description.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelConfig {
    /// Display name.
    pub name: String,
    /// Map layout.
    pub map: MapConfig,
    /// Player tuning.
    #[serde(default)]
    pub player: PlayerConfig,
    /// Zombie tuning.
    #[serde(default)]
    pub zombies: ZombieConfig,
}

impl LevelConfig {
    /// Parses and validates a level. `origin` names the source in errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigLoadError::Parse`] or [`ConfigLoadError::Invalid`].
    pub fn from_toml_str(text: &str, origin: impl AsRef<Path>) -> ConfigResult<Self> {
        let origin = origin.as_ref();
        let level: Self = toml::from_str(text).map_err(|source| ConfigLoadError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        level.validate().map_err(|reason| ConfigLoadError::Invalid {
            path: origin.to_path_buf(),
            reason,
        })?;
        Ok(level)
    }

    /// Number of tiles on the map.
    #[must_use]
    pub fn tile_count(&self) -> u64 {
        u64::from(self.map.width) * u64::from(self.map.height)
    }

    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(String::from("level name must not be empty"));
        }
        if self.map.width == 0 || self.map.height == 0 {
            return Err(format!(
                "map must be at least 1x1, got {}x{}",
                self.map.width, self.map.height
            ));
        }
        // Written as `!(x > 0.0)` so NaN is rejected too
        if !(self.map.tile_size > 0.0) {
            return Err(format!("map.tile_size must be positive, got {}", self.map.tile_size));
        }
        if !(self.player.speed > 0.0 && self.zombies.speed > 0.0) {
            return Err(String::from("player.speed and zombies.speed must be positive"));
        }
        if !(self.player.sprint_multiplier >= 1.0) {
            return Err(format!(
                "player.sprint_multiplier must be at least 1.0, got {}",
                self.player.sprint_multiplier
            ));
        }
        if !(0.0..=1.0).contains(&self.zombies.spawn_rate) {
            return Err(format!(
                "zombies.spawn_rate must be within 0.0..=1.0, got {}",
                self.zombies.spawn_rate
            ));
        }
        if self.zombies.decision_interval_ms == 0 {
            return Err(String::from("zombies.decision_interval_ms must be at least 1"));
        }
        Ok(())
    }
}

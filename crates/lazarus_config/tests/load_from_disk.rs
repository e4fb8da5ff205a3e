//! Integration tests for loading settings and levels from real files.

use lazarus_config::{ConfigLoadError, ConfigLoader, StartupSettings, TomlLevelLoader};
use std::path::PathBuf;
use std::time::Duration;

fn temp_config_path(stem: &str) -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("test_lazarus_{stem}_{id}.toml"))
}

#[test]
fn test_settings_point_at_loadable_level() {
    let level_path = temp_config_path("level");
    std::fs::write(
        &level_path,
        "name = \"Cellar\"\n[map]\nwidth = 16\nheight = 12\ntile_size = 2.0\n",
    )
    .unwrap();

    let settings_path = temp_config_path("settings");
    std::fs::write(
        &settings_path,
        format!(
            "level = {:?}\nsurface_timeout_ms = 750\n[audio]\nmaster_volume = 0.5\n",
            level_path.display().to_string()
        ),
    )
    .unwrap();

    let settings = StartupSettings::load_or_default(Some(settings_path.as_path())).unwrap();
    assert_eq!(settings.surface_timeout(), Some(Duration::from_millis(750)));
    assert!((settings.audio.master_volume - 0.5).abs() < f32::EPSILON);

    let level = TomlLevelLoader.load(&settings.level).unwrap();
    assert_eq!(level.name, "Cellar");
    assert_eq!(level.tile_count(), 16 * 12);

    std::fs::remove_file(&level_path).ok();
    std::fs::remove_file(&settings_path).ok();
}

#[test]
fn test_malformed_level_reports_path() {
    let level_path = temp_config_path("broken");
    std::fs::write(&level_path, "name = \"Broken\"\n[map\nwidth = 3\n").unwrap();

    let err = TomlLevelLoader
        .load(level_path.to_str().unwrap())
        .unwrap_err();
    assert!(matches!(err, ConfigLoadError::Parse { .. }));
    assert!(err.to_string().contains(&level_path.display().to_string()));

    std::fs::remove_file(&level_path).ok();
}

#[test]
fn test_no_settings_file_uses_defaults() {
    let settings = StartupSettings::load_or_default(None).unwrap();
    assert_eq!(settings, StartupSettings::default());
}

#[test]
fn test_shipped_config_files_are_valid() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..");

    let settings = StartupSettings::load(root.join("config/lazarus.toml")).unwrap();
    let level_path = root.join(&settings.level);

    let level = TomlLevelLoader.load(level_path.to_str().unwrap()).unwrap();
    assert!(!level.name.is_empty());
}

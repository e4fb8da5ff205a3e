//! # LAZARUS Launcher
//!
//! ```bash
//! # Defaults (level at config/level.toml, unbounded window wait)
//! ./lazarus
//!
//! # With a settings file
//! RUST_LOG=debug ./lazarus config/lazarus.toml
//! ```

use std::fmt::Display;
use std::path::PathBuf;
use std::process::ExitCode;

use lazarus::config::StartupSettings;
use lazarus::{run_game, UiThread};

const UI_THREAD_NAME: &str = "lazarus-ui";

fn main() -> ExitCode {
    lazarus::logging::init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "LAZARUS starting");

    let settings_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = match StartupSettings::load_or_default(settings_path.as_deref()) {
        Ok(settings) => settings,
        Err(err) => return abort(&err),
    };

    let ui = match UiThread::spawn(UI_THREAD_NAME) {
        Ok(ui) => ui,
        Err(err) => return abort(&err),
    };

    match run_game(&ui, &settings) {
        Ok(controller) => {
            tracing::info!(
                frames = controller.frames_run(),
                audio = ?controller.audio_exit(),
                "shutdown complete"
            );
            ui.shutdown();
            ExitCode::SUCCESS
        }
        Err(err) => {
            let code = abort(&err);
            // The UI thread may still be inside the task that timed out: close, don't join
            drop(ui);
            code
        }
    }
}

fn abort(err: &dyn Display) -> ExitCode {
    tracing::error!("startup aborted: {err}");
    ExitCode::FAILURE
}

//! # Log Output
//!
//! Library code only emits through `tracing`. Binaries call [`init`] once to
//! print those events; `RUST_LOG` overrides the default `info` filter.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Installs the global fmt subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .try_init()
        .is_ok()
}

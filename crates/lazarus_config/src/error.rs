//! # Config Error Types

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading settings or a level description.
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    /// The source could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The source is not valid TOML for the expected schema.
    #[error("malformed {}: {source}", path.display())]
    Parse {
        /// The file that failed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// The source parsed but holds values the game cannot run with.
    #[error("invalid {}: {reason}", path.display())]
    Invalid {
        /// The file that failed.
        path: PathBuf,
        /// What was wrong.
        reason: String,
    },
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigLoadError>;

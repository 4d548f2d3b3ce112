//! Error types for palette, config and storage operations.
//!
//! The preference holder itself never fails: environment problems degrade to
//! defaults and are logged. These errors surface only from explicit loading
//! and storage calls.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while loading or persisting theme data.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Data could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A string did not name a color mode.
    #[error("invalid color mode '{0}' (expected 'light' or 'dark')")]
    InvalidMode(String),

    /// A color value could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A palette file named a color role that does not exist.
    #[error("unknown color role '{0}'")]
    UnknownRole(String),

    /// Configuration was structurally valid but semantically wrong.
    #[error("config error: {0}")]
    Config(String),
}

impl ThemeError {
    /// Create an I/O error tagged with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for ThemeError {
    fn from(err: serde_json::Error) -> Self {
        ThemeError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ThemeError {
    fn from(err: serde_yaml::Error) -> Self {
        ThemeError::Serialization(err.to_string())
    }
}

//! Error types for the hostdiag crate.

use thiserror::Error;

/// Result type alias for hostdiag operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while collecting a diagnostic bundle.
///
/// Only a handful of these are fatal to a run. Failures inside an individual
/// check are recorded as a [`crate::runner::CheckOutcome`] instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file or directory.
    #[error("Failed to access {path}: {reason}")]
    Io { path: String, reason: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Not enough free space to hold the bundle.
    #[error(
        "Insufficient free disk space in {path}: {available} bytes available, {required} bytes required"
    )]
    InsufficientSpace {
        path: String,
        available: u64,
        required: u64,
    },

    /// Failed to write the bundle archive.
    #[error("Failed to write archive {path}: {reason}")]
    Archive { path: String, reason: String },

    /// Failed to serialize the bundle manifest.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Failed to collect system information.
    #[error("Failed to collect system information: {0}")]
    Collection(String),
}

impl Error {
    /// Build an [`Error::Io`] that remembers which path was being accessed.
    pub fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().display().to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            path: String::new(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

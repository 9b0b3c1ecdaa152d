//! Error types for brokkr-core
//!
//! One variant per failure class of the runtime subsystem. Bulk discovery
//! swallows and logs these; user-initiated single operations propagate them.

use std::path::PathBuf;

use thiserror::Error;

use crate::platform::Platform;

/// Result type alias using brokkr-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Brokkr's runtime subsystem
#[derive(Error, Debug)]
pub enum Error {
    /// Executable or manifest missing - expected, non-fatal
    #[error("Not found: {path}")]
    NotFound { path: PathBuf },

    /// Architecture/OS mismatch - filters the candidate out
    #[error("Incompatible platform: {platform}")]
    Incompatible { platform: Platform },

    /// Malformed manifest or probe output
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Subprocess probe failed to run or returned unparseable output
    #[error("Failed to probe {path}: {message}")]
    Probe { path: PathBuf, message: String },

    /// A verified file's hash does not match the manifest
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Archive does not have the expected shape (e.g. no single root directory)
    #[error("Invalid archive: {message}")]
    Archive { message: String },

    /// Filesystem operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a not-found error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an incompatible-platform error
    pub fn incompatible(platform: Platform) -> Self {
        Self::Incompatible { platform }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a probe error
    pub fn probe(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Probe {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-archive error
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    /// True for errors that only mean "this candidate is unusable",
    /// never "the scan is broken"
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Incompatible { .. } | Self::Probe { .. }
        )
    }
}

//! Error types for workspace directory handling.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing or cleaning region directories.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Removing an existing directory failed.
    #[error("failed to remove {path}: {source}")]
    Remove {
        /// Directory that could not be removed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Creating a directory failed.
    #[error("failed to create {path}: {source}")]
    Create {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The path exists but is a regular file, not a directory.
    #[error("{0} exists and is not a directory")]
    NotADirectory(PathBuf),

    /// A country code or region identifier is not a single plain file name.
    #[error("'{0}' cannot be used as a directory name")]
    InvalidName(String),

    /// Generic I/O error while listing or clearing a directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

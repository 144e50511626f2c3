//! Error types for background mode.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Background mode error type.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// `fork()` failed.
    #[error("Fork #{stage} failed: {source}")]
    ForkFailed {
        /// 1 for the first fork, 2 for the second
        stage: u8,
        #[source]
        source: io::Error,
    },

    /// The intermediate process did not exit cleanly.
    #[error("Background process failed to detach (exit status {})", .status.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    DetachFailed {
        /// Exit code of the intermediate process, `None` if it was signalled
        status: Option<i32>,
    },

    /// Failed to start a new session or reset the process environment.
    #[error("Failed to set up daemon session: {0}")]
    Session(#[source] io::Error),

    /// Failed to create or write into the state directory.
    #[error("Failed to access state directory {path}: {source}")]
    StateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to redirect standard streams.
    #[error("Failed to redirect standard streams: {0}")]
    Redirect(#[source] io::Error),

    /// Failed to serialize the status record.
    #[error("Failed to serialize status record: {0}")]
    Status(#[from] serde_json::Error),

    /// Failed to print the status line for the caller.
    #[error("Failed to report status: {0}")]
    Report(#[source] io::Error),

    /// Background mode is not available on this platform.
    #[error("Background mode is not supported on this platform")]
    Unsupported,
}

impl DaemonError {
    pub(crate) fn state_dir(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::StateDir {
            path: path.into(),
            source,
        }
    }

    /// Returns true if a `fork()` call itself failed.
    #[must_use]
    pub fn is_fork_failure(&self) -> bool {
        matches!(self, Self::ForkFailed { .. })
    }
}

/// Result type for background mode operations.
pub type Result<T> = std::result::Result<T, DaemonError>;

//! Follow-up command error types.

use std::io;

use thiserror::Error;

/// Errors from running the follow-up command.
///
/// None of these abort a reminder run; the notification has already been
/// delivered when the command runs.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The shell could not be started.
    #[error("Failed to start shell '{shell}': {source}")]
    Spawn {
        shell: String,
        #[source]
        source: io::Error,
    },

    /// The command ran and exited unsuccessfully.
    #[error("Command '{command}' failed with exit status {}", .status.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    CommandFailed {
        command: String,
        /// Exit code, `None` if terminated by a signal
        status: Option<i32>,
    },
}

impl ExecError {
    /// Exit code of the failed command, if it exited normally.
    #[must_use]
    pub fn exit_status(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { status, .. } => *status,
            Self::Spawn { .. } => None,
        }
    }
}

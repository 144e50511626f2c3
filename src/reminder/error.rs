//! Error types for reminder runs.

use thiserror::Error;

use crate::daemon::DaemonError;
use crate::duration::DurationError;
use crate::notification::NotificationError;
use crate::types::ReminderPhase;

/// Errors that abort a reminder run.
///
/// Follow-up command failures are not listed here; they are reported through
/// [`RunOutcome`](super::RunOutcome) instead.
#[derive(Debug, Error)]
pub enum ReminderError {
    /// The timer string could not be parsed.
    #[error(transparent)]
    Duration(#[from] DurationError),

    /// The notification could not be delivered.
    #[error(transparent)]
    Notification(#[from] NotificationError),

    /// Detaching from the terminal failed.
    #[error(transparent)]
    Daemon(#[from] DaemonError),

    /// An operation was requested in a phase that does not allow it.
    #[error("Cannot {action} while {}", .phase.as_str())]
    InvalidPhase {
        action: &'static str,
        phase: ReminderPhase,
    },
}

impl ReminderError {
    /// Returns a hint for the user, if one applies.
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Duration(e) => Some(e.suggestion()),
            Self::Notification(e) => Some(e.suggestion()),
            Self::Daemon(e) if e.is_fork_failure() => {
                Some("check the per-user process limit (ulimit -u)")
            }
            Self::Daemon(_) | Self::InvalidPhase { .. } => None,
        }
    }
}

/// Result type for reminder operations.
pub type Result<T> = std::result::Result<T, ReminderError>;

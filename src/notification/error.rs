//! Notification dispatch error types.

use thiserror::Error;

/// Errors that can occur while sending a notification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// The platform identifier has no notifier backend.
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// The notifier (or URL opener) program could not be started.
    #[error("Notifier '{program}' is not available: {reason}")]
    NotifierUnavailable {
        /// Program that could not be started
        program: String,
        /// Why it could not be started
        reason: String,
    },

    /// The notifier (or URL opener) ran but reported failure.
    #[error("Notifier '{program}' failed with {}", describe_status(.status))]
    NotifierFailed {
        /// Program that failed
        program: String,
        /// Exit code, `None` if terminated by a signal
        status: Option<i32>,
    },
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

impl NotificationError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::UnsupportedPlatform(_) => "run on macOS or Linux",
            Self::NotifierUnavailable { .. } => {
                "install terminal-notifier (macOS) or libnotify and xdg-utils (Linux)"
            }
            Self::NotifierFailed { .. } => "check that a desktop session is running",
        }
    }
}

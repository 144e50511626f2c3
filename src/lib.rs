//! ywfm library
//!
//! Core of the `ywfm` reminder CLI: wait for a timer, send one desktop
//! notification and run an optional follow-up command, either attached to the
//! terminal or from a detached background process.
//!
//! It includes:
//! - Timer string parsing (`1h10m15s`)
//! - Platform notification dispatch (terminal-notifier on macOS, notify-send
//!   and xdg-open on Linux)
//! - Follow-up command execution through the shell
//! - Double-fork daemonization with a per-user state directory
//! - The reminder engine tying these together
//! - CLI command parsing and display utilities

pub mod cli;
pub mod daemon;
pub mod duration;
pub mod executor;
pub mod notification;
pub mod reminder;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    DaemonStatus, HostInfo, PreparedReminder, ReminderConfig, ReminderPhase, ReminderRequest,
    ResolvedSchedule,
};

pub use daemon::{Daemonize, DaemonError, DetachedHandle, Detachment, ForkDaemonizer, StateDir};
pub use duration::DurationError;
pub use executor::{CommandRunner, ExecError, MockCommandRunner, ShellExecutor};
pub use notification::{
    Backend, MockNotificationSender, NotificationDispatcher, NotificationError, NotificationSender,
};
pub use reminder::{Continuation, ProgressSink, ReminderEngine, ReminderError, RunOutcome};

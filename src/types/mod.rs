//! Core data types for ywfm.
//!
//! This module defines the data structures used for:
//! - Reminder configuration with validation
//! - The reminder request and its one-time normalization
//! - The resolved schedule (wait time, creation and trigger timestamps)
//! - The status record printed to the caller and persisted in background mode
//! - Orchestrator phases

use std::path::PathBuf;

use chrono::{DateTime, Local, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::duration::{self, DurationError};

/// Timestamp format used for `created_at`/`trigger_at` and run file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Default message used when the wait time is odd.
pub const MESSAGE_ODD: &str = "Well done!";

/// Default message used when the wait time is even.
pub const MESSAGE_EVEN: &str = "You're welcome!";

// ============================================================================
// ReminderPhase
// ============================================================================

/// Represents the current phase of a reminder run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReminderPhase {
    /// Request not yet normalized
    #[default]
    Init,
    /// Schedule resolved, nothing started yet
    Scheduled,
    /// Detaching from the terminal
    Daemonizing,
    /// Blocking for the resolved wait time
    Waiting,
    /// Sending the notification
    Notifying,
    /// Running the follow-up command
    Executing,
    /// Run completed
    Done,
    /// Run aborted on an unrecoverable error
    Failed,
}

impl ReminderPhase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderPhase::Init => "init",
            ReminderPhase::Scheduled => "scheduled",
            ReminderPhase::Daemonizing => "daemonizing",
            ReminderPhase::Waiting => "waiting",
            ReminderPhase::Notifying => "notifying",
            ReminderPhase::Executing => "executing",
            ReminderPhase::Done => "done",
            ReminderPhase::Failed => "failed",
        }
    }
}

// ============================================================================
// ReminderConfig
// ============================================================================

/// Configuration for reminder runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderConfig {
    /// Program name, used as the default subject and for the PID file
    pub program_name: String,
    /// Minimum wait in seconds; shorter timers are raised to this value
    pub min_wait_seconds: u64,
    /// Timer used when none is given
    pub default_timer: String,
    /// Directory holding the PID file, logs and status files
    pub state_dir: PathBuf,
    /// Platform identifier used to pick the notifier backend
    pub platform: String,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            program_name: "ywfm".to_string(),
            min_wait_seconds: 15,
            default_timer: "15m".to_string(),
            state_dir: default_state_dir("ywfm"),
            platform: std::env::consts::OS.to_string(),
        }
    }
}

impl ReminderConfig {
    /// Creates a new configuration with the specified minimum wait.
    pub fn with_min_wait_seconds(mut self, seconds: u64) -> Self {
        self.min_wait_seconds = seconds;
        self
    }

    /// Creates a new configuration with the specified state directory.
    pub fn with_state_dir(mut self, state_dir: impl Into<PathBuf>) -> Self {
        self.state_dir = state_dir.into();
        self
    }

    /// Creates a new configuration with the specified platform identifier.
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.program_name.is_empty() {
            return Err("program name must not be empty".to_string());
        }
        if let Err(e) = duration::parse(&self.default_timer) {
            return Err(format!("default timer is invalid: {}", e));
        }
        // The daemon changes its working directory to `/`.
        if !self.state_dir.is_absolute() {
            return Err(format!(
                "state directory must be an absolute path: {}",
                self.state_dir.display()
            ));
        }
        Ok(())
    }

    /// File name of the shared PID file.
    pub fn pid_file_name(&self) -> String {
        format!("{}.pid", self.program_name)
    }
}

/// Resolves the per-user state directory (`~/.local/state/<name>` on most hosts).
pub fn default_state_dir(program_name: &str) -> PathBuf {
    dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("state")))
        .unwrap_or_else(std::env::temp_dir)
        .join(program_name)
}

// ============================================================================
// ReminderRequest
// ============================================================================

/// A reminder as requested by the user, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderRequest {
    /// Notification title
    pub subject: Option<String>,
    /// Notification body
    pub message: Option<String>,
    /// Timer string such as `1h10m15s`
    pub timer: Option<String>,
    /// URL to open along with the notification
    pub open_url: Option<String>,
    /// Shell command to run after the notification
    pub command: Option<String>,
    /// Render a per-second progress bar while waiting (attached runs only)
    pub show_progress: bool,
    /// Detach from the terminal and run in the background
    pub background: bool,
}

impl ReminderRequest {
    /// Applies defaults and resolves the schedule.
    ///
    /// This is the single normalization step: the subject, timer and message
    /// defaults are filled in, the timer is parsed and raised to the configured
    /// floor if needed. Raising the timer never fails the run; it is recorded
    /// as a note instead.
    ///
    /// # Errors
    ///
    /// Returns a [`DurationError`] if the timer string is malformed or the
    /// trigger time cannot be represented.
    pub fn normalize(
        self,
        config: &ReminderConfig,
        now: DateTime<Local>,
    ) -> Result<PreparedReminder, DurationError> {
        let subject = self
            .subject
            .unwrap_or_else(|| config.program_name.clone());
        let timer = self
            .timer
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| config.default_timer.clone());

        let schedule = ResolvedSchedule::resolve(&timer, config.min_wait_seconds, now)?;

        let mut notes = Vec::new();
        if schedule.floor_applied {
            notes.push(format!(
                "[INFO] Given timer value is too small, applying minimum wait of {} seconds.",
                config.min_wait_seconds
            ));
        }
        if self.background {
            notes.push(format!(
                "[INFO] Output and error message of background process are stored in '{}'.",
                config.state_dir.display()
            ));
        }

        let message = self
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| default_message(schedule.wait_seconds).to_string());

        Ok(PreparedReminder {
            subject,
            message,
            timer,
            open_url: self.open_url,
            command: self.command,
            show_progress: self.show_progress,
            background: self.background,
            schedule,
            notes,
        })
    }
}

/// Returns the default message for the given wait time.
///
/// Odd wait times select [`MESSAGE_ODD`], even ones [`MESSAGE_EVEN`].
pub fn default_message(wait_seconds: u64) -> &'static str {
    if wait_seconds % 2 == 1 {
        MESSAGE_ODD
    } else {
        MESSAGE_EVEN
    }
}

// ============================================================================
// ResolvedSchedule
// ============================================================================

/// When the reminder fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchedule {
    /// Effective wait, never below the configured floor
    pub wait_seconds: u64,
    /// Whether the parsed timer was raised to the floor
    pub floor_applied: bool,
    /// When the request was normalized
    pub created_at: DateTime<Local>,
    /// `created_at + wait_seconds`
    pub trigger_at: DateTime<Local>,
}

impl ResolvedSchedule {
    /// Parses `timer` and derives the schedule relative to `now`.
    pub fn resolve(
        timer: &str,
        min_wait_seconds: u64,
        now: DateTime<Local>,
    ) -> Result<Self, DurationError> {
        let parsed = duration::parse(timer)?;
        let floor_applied = parsed < min_wait_seconds;
        let wait_seconds = parsed.max(min_wait_seconds);

        let trigger_at = i64::try_from(wait_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or_else(|| DurationError::Overflow(timer.to_string()))?;

        Ok(Self {
            wait_seconds,
            floor_applied,
            created_at: now,
            trigger_at,
        })
    }

    /// `created_at` in [`TIMESTAMP_FORMAT`]; also the key of per-run files.
    pub fn created_at_label(&self) -> String {
        self.created_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// `trigger_at` in [`TIMESTAMP_FORMAT`].
    pub fn trigger_at_label(&self) -> String {
        self.trigger_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

// ============================================================================
// PreparedReminder
// ============================================================================

/// A normalized reminder: every default filled in and the schedule resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedReminder {
    pub subject: String,
    pub message: String,
    pub timer: String,
    pub open_url: Option<String>,
    pub command: Option<String>,
    pub show_progress: bool,
    pub background: bool,
    pub schedule: ResolvedSchedule,
    /// Diagnostic notes such as "timer floor applied"
    pub notes: Vec<String>,
}

// ============================================================================
// Status record
// ============================================================================

/// Snapshot of a run: identity, parameters, schedule and host.
///
/// Printed as one JSON line by a backgrounded invocation, written to the
/// per-run status file, and printed pretty before an attached wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Process that performs the wait
    pub pid: u32,
    /// Request parameters after normalization
    pub params: StatusParams,
    /// Resolved schedule
    pub info: StatusInfo,
    /// Host descriptors and notes
    pub extra: StatusExtra,
}

/// Request parameters section of the status record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusParams {
    pub subject: String,
    pub message: String,
    /// The timer string as given (or defaulted)
    pub duration: String,
    pub url: Option<String>,
    pub command: Option<String>,
    #[serde(rename = "show-progress")]
    pub show_progress: bool,
    pub background: bool,
}

/// Schedule section of the status record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub created_at: String,
    pub trigger_at: String,
    pub seconds: u64,
    pub floor_applied: bool,
}

/// Host section of the status record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusExtra {
    #[serde(flatten)]
    pub host: HostInfo,
    pub notes: Vec<String>,
}

impl DaemonStatus {
    /// Builds the status record for `pid`.
    pub fn new(pid: u32, reminder: &PreparedReminder, host: HostInfo) -> Self {
        Self {
            pid,
            params: StatusParams {
                subject: reminder.subject.clone(),
                message: reminder.message.clone(),
                duration: reminder.timer.clone(),
                url: reminder.open_url.clone(),
                command: reminder.command.clone(),
                show_progress: reminder.show_progress,
                background: reminder.background,
            },
            info: StatusInfo {
                created_at: reminder.schedule.created_at_label(),
                trigger_at: reminder.schedule.trigger_at_label(),
                seconds: reminder.schedule.wait_seconds,
                floor_applied: reminder.schedule.floor_applied,
            },
            extra: StatusExtra {
                host,
                notes: reminder.notes.clone(),
            },
        }
    }

    /// Returns a copy of this record for another process id.
    #[must_use]
    pub fn with_pid(&self, pid: u32) -> Self {
        Self {
            pid,
            ..self.clone()
        }
    }

    /// Serializes the record as a single line.
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serializes the record as an indented document.
    pub fn to_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parses a record produced by [`to_line`](Self::to_line) or
    /// [`to_pretty`](Self::to_pretty).
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

// ============================================================================
// HostInfo
// ============================================================================

/// Descriptors of the host the reminder runs on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    /// Kernel name, e.g. `Linux` or `Darwin`
    pub os_name: String,
    /// CPU architecture
    pub machine: String,
    /// Host name
    pub node: String,
    /// Kernel name, release and architecture
    pub platform: String,
}

impl HostInfo {
    /// Collects descriptors of the current host.
    #[cfg(unix)]
    pub fn detect() -> Self {
        use nix::sys::utsname::uname;
        use nix::unistd::gethostname;

        let node = gethostname()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        match uname() {
            Ok(uts) => {
                let os_name = uts.sysname().to_string_lossy().into_owned();
                let machine = uts.machine().to_string_lossy().into_owned();
                let platform = format!(
                    "{}-{}-{}",
                    os_name,
                    uts.release().to_string_lossy(),
                    machine
                );
                Self {
                    os_name,
                    machine,
                    node,
                    platform,
                }
            }
            Err(e) => {
                tracing::debug!("uname failed, falling back to build target: {}", e);
                Self::from_build_target(node)
            }
        }
    }

    /// Collects descriptors of the current host.
    #[cfg(not(unix))]
    pub fn detect() -> Self {
        Self::from_build_target(String::new())
    }

    fn from_build_target(node: String) -> Self {
        Self {
            os_name: std::env::consts::OS.to_string(),
            machine: std::env::consts::ARCH.to_string(),
            node,
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Command definitions for the ywfm CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::{ReminderConfig, ReminderRequest};

// ============================================================================
// CLI Structure
// ============================================================================

/// ywfm - notify me when the timer is up
#[derive(Parser, Debug)]
#[command(
    name = "ywfm",
    version,
    about = "Send a desktop notification after a timer elapses",
    long_about = "Waits for the given timer, sends a desktop notification (optionally \
                  opening a URL) and then runs an optional shell command.\n\
                  With --background the wait happens in a detached process.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute; without one a reminder is scheduled
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub reminder: ReminderArgs,

    /// Directory for the PID file, logs and status records
    #[arg(long, env = "YWFM_STATE_DIR", global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Minimum wait in seconds
    #[arg(long, env = "YWFM_MIN_WAIT", hide = true, value_name = "SECONDS")]
    pub min_wait: Option<u64>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Builds the run configuration from defaults and overrides.
    pub fn config(&self) -> ReminderConfig {
        let mut config = ReminderConfig::default();
        if let Some(dir) = &self.state_dir {
            config = config.with_state_dir(dir.clone());
        }
        if let Some(seconds) = self.min_wait {
            config = config.with_min_wait_seconds(seconds);
        }
        config
    }
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the most recent background reminder
    Status,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Reminder Arguments
// ============================================================================

/// Arguments describing a reminder
#[derive(Args, Debug, Clone, Default)]
pub struct ReminderArgs {
    /// Notification title [default: ywfm]
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Notification body [default: depends on the wait time]
    #[arg(short, long)]
    pub message: Option<String>,

    /// Wait time such as 1h10m15s, 10m or 30s [default: 15m]
    #[arg(short, long, value_parser = validate_timer)]
    pub timer: Option<String>,

    /// URL to open with the notification
    #[arg(short, long, value_name = "URL")]
    pub open_url: Option<String>,

    /// Shell command to run after the notification
    #[arg(short, long)]
    pub command: Option<String>,

    /// Show a progress bar while waiting
    #[arg(short = 'p', long)]
    pub show_progress: bool,

    /// Wait in a detached background process
    #[arg(short, long)]
    pub background: bool,
}

impl ReminderArgs {
    /// Converts the arguments into a reminder request.
    pub fn into_request(self) -> ReminderRequest {
        ReminderRequest {
            subject: self.subject,
            message: self.message,
            timer: self.timer,
            open_url: self.open_url,
            command: self.command,
            show_progress: self.show_progress,
            background: self.background,
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Rejects timers containing whitespace.
///
/// The grammar itself is checked when the reminder is normalized, so that
/// malformed timers are reported like every other run error.
fn validate_timer(s: &str) -> Result<String, String> {
    if s.chars().any(char::is_whitespace) {
        return Err("timer must not contain whitespace".to_string());
    }
    Ok(s.to_string())
}

// ============================================================================
// Tests
// ============================================================================

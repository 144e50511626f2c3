//! Reminder engine.
//!
//! Drives one reminder through its phases:
//!
//! ```text
//! Scheduled → (Daemonizing →) Waiting → Notifying → Executing → Done
//! ```
//!
//! with `Failed` reachable from detachment and notification. Detachment is
//! synchronous and happens before any async runtime exists; the rest of the
//! run is async.

use tokio::time::{interval_at, sleep, Duration, Instant, MissedTickBehavior};

use super::error::{ReminderError, Result};
use crate::daemon::{Daemonize, DetachedHandle, Detachment};
use crate::executor::{CommandRunner, ExecError};
use crate::notification::NotificationSender;
use crate::types::{DaemonStatus, HostInfo, PreparedReminder, ReminderPhase};

// ============================================================================
// Continuation / RunOutcome / ProgressSink
// ============================================================================

/// What the current process does after [`ReminderEngine::detach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Keep going: wait, notify and run the command.
    Proceed,
    /// This process is an ancestor of the daemon and must exit with 0.
    Exit,
}

/// Result of a completed run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Seconds actually waited
    pub wait_seconds: u64,
    /// Failure of the follow-up command, if any
    pub command_error: Option<ExecError>,
}

impl RunOutcome {
    /// Returns true if the follow-up command (if any) succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.command_error.is_none()
    }
}

/// Receives per-second progress while waiting.
pub trait ProgressSink {
    /// Called once before the first second elapses.
    fn start(&mut self, timer: &str, total_seconds: u64);
    /// Called after each elapsed second.
    fn tick(&mut self, elapsed_seconds: u64, total_seconds: u64);
    /// Called once after the last second.
    fn finish(&mut self);
}

// ============================================================================
// ReminderEngine
// ============================================================================

/// Runs a single prepared reminder.
pub struct ReminderEngine<N, E> {
    reminder: PreparedReminder,
    notifier: N,
    executor: E,
    host: HostInfo,
    phase: ReminderPhase,
    daemon: Option<DetachedHandle>,
}

impl<N: NotificationSender, E: CommandRunner> ReminderEngine<N, E> {
    /// Creates an engine for an already normalized reminder.
    pub fn new(reminder: PreparedReminder, notifier: N, executor: E) -> Self {
        Self {
            reminder,
            notifier,
            executor,
            host: HostInfo::detect(),
            phase: ReminderPhase::Scheduled,
            daemon: None,
        }
    }

    /// Overrides the host descriptors recorded in status records.
    #[must_use]
    pub fn with_host(mut self, host: HostInfo) -> Self {
        self.host = host;
        self
    }

    pub fn phase(&self) -> ReminderPhase {
        self.phase
    }

    pub fn reminder(&self) -> &PreparedReminder {
        &self.reminder
    }

    /// The detached daemon, once this process has become it.
    pub fn daemon(&self) -> Option<&DetachedHandle> {
        self.daemon.as_ref()
    }

    /// Status record of this run as seen from process `pid`.
    pub fn status(&self, pid: u32) -> DaemonStatus {
        DaemonStatus::new(pid, &self.reminder, self.host.clone())
    }

    /// Detaches from the terminal if the reminder runs in the background.
    ///
    /// Attached reminders return [`Continuation::Proceed`] without side
    /// effects. Background reminders daemonize: ancestors get
    /// [`Continuation::Exit`], the daemon gets [`Continuation::Proceed`].
    ///
    /// # Errors
    ///
    /// Returns an error if called twice or if daemonization fails; the engine
    /// is then `Failed`.
    pub fn detach(&mut self, daemonizer: &impl Daemonize) -> Result<Continuation> {
        if self.phase != ReminderPhase::Scheduled {
            return Err(self.invalid_phase("detach"));
        }
        if !self.reminder.background {
            return Ok(Continuation::Proceed);
        }

        self.phase = ReminderPhase::Daemonizing;
        match daemonizer.daemonize(&self.status(std::process::id())) {
            Ok(Detachment::Ancestor) => {
                // This process's part of the run is over.
                self.phase = ReminderPhase::Done;
                Ok(Continuation::Exit)
            }
            Ok(Detachment::Daemon(handle)) => {
                tracing::debug!("Running detached as pid {}", handle.pid);
                self.daemon = Some(handle);
                Ok(Continuation::Proceed)
            }
            Err(e) => {
                self.phase = ReminderPhase::Failed;
                Err(e.into())
            }
        }
    }

    /// Waits, sends the notification and runs the follow-up command.
    ///
    /// When progress is requested and the run is attached, `progress` receives
    /// one tick per second instead of a single sleep.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not ready to wait (a background
    /// reminder that has not detached, or a finished run) or if the
    /// notification fails. A failing follow-up command is not an error; see
    /// [`RunOutcome::command_error`].
    pub async fn deliver(
        &mut self,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<RunOutcome> {
        if !self.ready_to_wait() {
            return Err(self.invalid_phase("deliver"));
        }

        self.phase = ReminderPhase::Waiting;
        let wait_seconds = self.reminder.schedule.wait_seconds;
        tracing::info!(
            "Waiting {} seconds until {}",
            wait_seconds,
            self.reminder.schedule.trigger_at_label()
        );
        let show_progress = self.reminder.show_progress && !self.reminder.background;
        match progress.filter(|_| show_progress) {
            Some(sink) => self.wait_with_progress(sink).await,
            None => sleep(Duration::from_secs(wait_seconds)).await,
        }

        self.phase = ReminderPhase::Notifying;
        let reminder = &self.reminder;
        if let Err(e) = self
            .notifier
            .send(&reminder.subject, &reminder.message, reminder.open_url.as_deref())
            .await
        {
            tracing::debug!("Notification failed: {}", e);
            self.phase = ReminderPhase::Failed;
            return Err(e.into());
        }

        self.phase = ReminderPhase::Executing;
        let command_error = match self.executor.execute(reminder.command.as_deref()).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("{}", e);
                Some(e)
            }
        };

        self.phase = ReminderPhase::Done;
        Ok(RunOutcome {
            wait_seconds,
            command_error,
        })
    }

    fn ready_to_wait(&self) -> bool {
        match self.phase {
            ReminderPhase::Scheduled => !self.reminder.background,
            ReminderPhase::Daemonizing => self.daemon.is_some(),
            _ => false,
        }
    }

    async fn wait_with_progress(&self, sink: &mut dyn ProgressSink) {
        let total = self.reminder.schedule.wait_seconds;
        sink.start(&self.reminder.timer, total);

        let period = Duration::from_secs(1);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        for elapsed in 1..=total {
            ticker.tick().await;
            sink.tick(elapsed, total);
        }

        sink.finish();
    }

    fn invalid_phase(&self, action: &'static str) -> ReminderError {
        ReminderError::InvalidPhase {
            action,
            phase: self.phase,
        }
    }
}

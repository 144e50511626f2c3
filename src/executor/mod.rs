//! Follow-up command execution.
//!
//! The follow-up command runs through `sh -c` after the notification has
//! been sent. Its standard streams are inherited, so in background mode its
//! output ends up in the run's log files.
//!
//! A failing command is reported as [`ExecError::CommandFailed`]; the reminder
//! engine logs it and still completes the run.

pub mod error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::process::Command;

pub use self::error::ExecError;

/// Shell used to interpret follow-up commands.
pub const DEFAULT_SHELL: &str = "sh";

#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Runs `command` if present; `None` is a successful no-op.
    async fn execute(&self, command: Option<&str>) -> Result<(), ExecError>;
}

// ============================================================================
// ShellExecutor
// ============================================================================

/// Runs commands with `<shell> -c <command>`.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl ShellExecutor {
    /// Creates an executor using the given shell.
    #[must_use]
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl CommandRunner for ShellExecutor {
    async fn execute(&self, command: Option<&str>) -> Result<(), ExecError> {
        let Some(command) = command else {
            return Ok(());
        };

        tracing::info!("Executing command: {}", command);

        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .status()
            .await
            .map_err(|e| ExecError::Spawn {
                shell: self.shell.clone(),
                source: e,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExecError::CommandFailed {
                command: command.to_string(),
                status: status.code(),
            })
        }
    }
}

// ============================================================================
// MockCommandRunner
// ============================================================================

#[derive(Debug, Default)]
pub struct MockCommandRunner {
    calls: Mutex<Vec<Option<String>>>,
    should_fail: AtomicBool,
}

impl MockCommandRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Every `execute` call, including ones with no command.
    #[must_use]
    pub fn get_calls(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl CommandRunner for MockCommandRunner {
    async fn execute(&self, command: Option<&str>) -> Result<(), ExecError> {
        self.calls.lock().unwrap().push(command.map(String::from));
        match command {
            Some(command) if self.should_fail.load(Ordering::SeqCst) => {
                Err(ExecError::CommandFailed {
                    command: command.to_string(),
                    status: Some(1),
                })
            }
            _ => Ok(()),
        }
    }
}

impl<T: CommandRunner> CommandRunner for &T {
    async fn execute(&self, command: Option<&str>) -> Result<(), ExecError> {
        (**self).execute(command).await
    }
}

//! ywfm - notify me when the timer is up
//!
//! Waits for a timer, sends a desktop notification and optionally runs a
//! follow-up command:
//! - attached, with an optional per-second progress bar
//! - or detached in the background, reporting its status as one JSON line

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser};

use ywfm::cli::{Cli, Commands, Display, TerminalProgress};
use ywfm::daemon::{is_process_alive, ForkDaemonizer, StateDir};
use ywfm::{
    Continuation, DurationError, NotificationDispatcher, NotificationError, ReminderConfig,
    ReminderEngine, ReminderError, ShellExecutor,
};

/// Main entry point
///
/// The async runtime is only built once the process has detached, so no
/// runtime state is ever forked.
fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli) {
        Display::show_error(&e.to_string());
        if let Some(hint) = hint_for(&e) {
            Display::show_hint(hint);
        }
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command {
        Some(Commands::Status) => show_tracked(&cli.config()),
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
            Ok(())
        }
        None => run_reminder(cli),
    }
}

/// Schedules and delivers one reminder.
fn run_reminder(cli: Cli) -> Result<()> {
    let config = cli.config();
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    // Both checks happen before anything is waited for or forked.
    let notifier =
        NotificationDispatcher::for_platform(&config.platform).map_err(ReminderError::from)?;
    let reminder = cli
        .reminder
        .into_request()
        .normalize(&config, chrono::Local::now())
        .map_err(ReminderError::from)?;

    let mut engine = ReminderEngine::new(reminder, notifier, ShellExecutor::default());

    let daemonizer = ForkDaemonizer::new(StateDir::from_config(&config));
    if engine.detach(&daemonizer)? == Continuation::Exit {
        return Ok(());
    }

    if !engine.reminder().background {
        Display::show_status(&engine.status(std::process::id()))
            .map_err(|e| anyhow!("Failed to print status: {}", e))?;
        Display::show_notes(&engine.reminder().notes);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("Failed to start async runtime: {}", e))?;

    let mut progress = TerminalProgress::stdout();
    let outcome = runtime.block_on(engine.deliver(Some(&mut progress)))?;

    if outcome.is_clean() {
        tracing::debug!("Reminder delivered after {} seconds", outcome.wait_seconds);
    }
    Ok(())
}

/// Shows the background reminder recorded in the state directory.
fn show_tracked(config: &ReminderConfig) -> Result<()> {
    let state = StateDir::from_config(config);
    let pid = state.read_pid()?;
    let alive = pid.is_some_and(is_process_alive);
    Display::show_tracked(state.root(), pid, alive);
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

/// Returns a hint for errors the user can act on.
fn hint_for(error: &anyhow::Error) -> Option<&'static str> {
    if let Some(e) = error.downcast_ref::<ReminderError>() {
        return e.suggestion();
    }
    if let Some(e) = error.downcast_ref::<DurationError>() {
        return Some(e.suggestion());
    }
    error
        .downcast_ref::<NotificationError>()
        .map(NotificationError::suggestion)
}

// ============================================================================
// Tests
// ============================================================================

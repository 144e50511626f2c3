//! Display utilities for the ywfm CLI.
//!
//! This module provides formatted output for:
//! - The status record of an attached run
//! - Notes and error messages
//! - The tracked background reminder
//! - The progress bar

use std::io::{self, Write};
use std::path::Path;

use crate::reminder::ProgressSink;
use crate::types::DaemonStatus;

/// Width of the progress bar in characters.
const BAR_WIDTH: usize = 40;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the status record of an attached run.
    pub fn show_status(status: &DaemonStatus) -> serde_json::Result<()> {
        println!("{}", status.to_pretty()?);
        Ok(())
    }

    /// Shows diagnostic notes, one per line.
    pub fn show_notes(notes: &[String]) {
        for note in notes {
            println!("{}", note);
        }
    }

    /// Shows the background reminder recorded in the PID file.
    pub fn show_tracked(state_dir: &Path, pid: Option<u32>, alive: bool) {
        println!("ywfm status");
        println!("─────────────────────────────");
        println!("State directory: {}", state_dir.display());
        match pid {
            Some(pid) => println!("Last reminder: pid {} ({})", pid, Self::liveness(alive)),
            None => println!("No background reminder recorded"),
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {}", message);
    }

    /// Shows a hint following an error message.
    pub fn show_hint(hint: &str) {
        eprintln!("  hint: {}", hint);
    }

    fn liveness(alive: bool) -> &'static str {
        if alive {
            "waiting"
        } else {
            "finished"
        }
    }
}

// ============================================================================
// TerminalProgress
// ============================================================================

/// Renders a single-line progress bar, redrawn every second.
pub struct TerminalProgress<W: Write> {
    out: W,
}

impl TerminalProgress<io::Stdout> {
    /// Progress bar on standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalProgress<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consumes the progress bar and returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProgressSink for TerminalProgress<W> {
    fn start(&mut self, timer: &str, total_seconds: u64) {
        // Output errors are ignored; the wait goes on regardless.
        let _ = writeln!(self.out, "Starting timer for {}...", timer);
        let _ = write!(self.out, "\r{}", format_bar(0, total_seconds));
        let _ = self.out.flush();
    }

    fn tick(&mut self, elapsed_seconds: u64, total_seconds: u64) {
        let _ = write!(self.out, "\r{}", format_bar(elapsed_seconds, total_seconds));
        let _ = self.out.flush();
    }

    fn finish(&mut self) {
        let _ = writeln!(self.out);
        let _ = self.out.flush();
    }
}

/// Formats `Progress: <pct>%|<bar>| <elapsed>/<total>s`.
fn format_bar(elapsed: u64, total: u64) -> String {
    let ratio = if total == 0 {
        1.0
    } else {
        elapsed.min(total) as f64 / total as f64
    };
    let filled = (ratio * BAR_WIDTH as f64).round() as usize;
    format!(
        "Progress: {:>3}%|{}{}| {}/{}s",
        (ratio * 100.0).floor() as u64,
        "#".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        elapsed,
        total
    )
}

// ============================================================================
// Tests
// ============================================================================

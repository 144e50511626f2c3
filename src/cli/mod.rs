//! CLI module for ywfm.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and the progress bar

pub mod commands;
pub mod display;

pub use commands::{Cli, Commands, ReminderArgs};
pub use display::{Display, TerminalProgress};

//! Background mode for ywfm.
//!
//! This module contains the daemonization machinery:
//! - `detach`: double-fork detachment and stream redirection
//! - `state`: the state directory (PID file, run logs, status files)
//! - `error`: error types

pub mod detach;
pub mod error;
pub mod state;

pub use detach::{Daemonize, DetachedHandle, Detachment, ForkDaemonizer, MockDaemonizer};
pub use error::DaemonError;
pub use state::{is_process_alive, RunFiles, StateDir};

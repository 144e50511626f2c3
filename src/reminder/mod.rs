//! Reminder orchestration.
//!
//! This module contains:
//! - `engine`: the state machine driving a reminder from scheduling to
//!   the follow-up command
//! - `error`: errors that abort a run

pub mod engine;
pub mod error;

pub use engine::{Continuation, ProgressSink, ReminderEngine, RunOutcome};
pub use error::ReminderError;

//! Timer string error types.

use thiserror::Error;

/// Errors that can occur while parsing a timer string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationError {
    /// The string does not match `(<N>h)?(<N>m)?(<N>s)?`.
    #[error("Invalid timer format: '{input}' ({reason})")]
    InvalidFormat {
        /// The rejected input
        input: String,
        /// What was wrong with it
        reason: String,
    },

    /// A component or the total does not fit in the seconds counter.
    #[error("Timer value is too large: '{0}'")]
    Overflow(String),
}

impl DurationError {
    pub(crate) fn invalid(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "use hours, minutes and seconds in that order, e.g. 1h10m15s",
            Self::Overflow(_) => "use a shorter timer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_format_display() {
        let err = DurationError::invalid("10x", "unexpected character 'x'");
        let msg = err.to_string();
        assert!(msg.contains("10x"));
        assert!(msg.contains("unexpected character"));
    }

    #[test]
    fn test_overflow_display() {
        let err = DurationError::Overflow("99999999999999999999h".to_string());
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_suggestion() {
        let err = DurationError::invalid("h", "missing number");
        assert!(err.suggestion().contains("1h10m15s"));
    }
}

//! Timer string parsing.
//!
//! A timer string is made of up to three components, each a non-negative
//! integer followed by a unit, in fixed order:
//!
//! ```text
//! (<N>h)?(<N>m)?(<N>s)?
//! ```
//!
//! # Example
//!
//! ```
//! use ywfm::duration::parse;
//!
//! assert_eq!(parse("1h10m15s").unwrap(), 4215);
//! assert_eq!(parse("10m").unwrap(), 600);
//! assert!(parse("10x").is_err());
//! ```

pub mod error;

pub use error::DurationError;

/// Seconds per unit, in the order the units must appear.
const UNITS: [(char, u64); 3] = [('h', 3600), ('m', 60), ('s', 1)];

/// Parses a timer string into a number of seconds.
///
/// The empty string is structurally valid and parses to zero; callers that
/// treat an empty timer as "absent" must check for it first.
///
/// # Errors
///
/// - [`DurationError::InvalidFormat`] if the string does not match the grammar
/// - [`DurationError::Overflow`] if the total does not fit in a `u64`
pub fn parse(input: &str) -> Result<u64, DurationError> {
    let mut total: u64 = 0;
    // Index into UNITS of the next unit allowed to appear.
    let mut next_unit = 0;
    let mut digits = String::new();

    for c in input.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let position = UNITS
            .iter()
            .position(|(unit, _)| *unit == c)
            .ok_or_else(|| DurationError::invalid(input, format!("unexpected character '{}'", c)))?;

        if digits.is_empty() {
            return Err(DurationError::invalid(
                input,
                format!("missing number before '{}'", c),
            ));
        }
        if position < next_unit {
            return Err(DurationError::invalid(
                input,
                format!("'{}' is out of order or repeated", c),
            ));
        }

        let value: u64 = digits
            .parse()
            .map_err(|_| DurationError::Overflow(input.to_string()))?;
        total = value
            .checked_mul(UNITS[position].1)
            .and_then(|seconds| total.checked_add(seconds))
            .ok_or_else(|| DurationError::Overflow(input.to_string()))?;

        digits.clear();
        next_unit = position + 1;
    }

    if !digits.is_empty() {
        return Err(DurationError::invalid(
            input,
            format!("number '{}' has no unit", digits),
        ));
    }

    Ok(total)
}

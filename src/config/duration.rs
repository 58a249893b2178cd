//! Compact duration literals.
//!
//! Token lifetimes are configured as strings like "3d", "12h" or
//! "1d12h30m". Units are days, hours, minutes and seconds; components
//! are summed.

use std::time::Duration;
use thiserror::Error;

/// Error type for duration literal parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("empty duration literal")]
    Empty,

    #[error("unexpected character `{0}` in duration literal")]
    UnexpectedChar(char),

    #[error("trailing digits without a unit (expected d, h, m or s)")]
    MissingUnit,

    #[error("duration must be greater than zero")]
    Zero,

    #[error("duration literal overflows")]
    Overflow,
}

/// Parse a compact duration literal into a [`Duration`].
pub fn parse_duration(literal: &str) -> Result<Duration, DurationParseError> {
    let literal = literal.trim();
    if literal.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let mut total: u64 = 0;
    let mut pending: Option<u64> = None;

    for ch in literal.chars() {
        if let Some(digit) = ch.to_digit(10) {
            let current = pending.unwrap_or(0);
            pending = Some(
                current
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(u64::from(digit)))
                    .ok_or(DurationParseError::Overflow)?,
            );
        } else {
            let value = pending
                .take()
                .ok_or(DurationParseError::UnexpectedChar(ch))?;
            let seconds_per_unit = match ch {
                'd' => 86_400,
                'h' => 3_600,
                'm' => 60,
                's' => 1,
                other => return Err(DurationParseError::UnexpectedChar(other)),
            };
            total = value
                .checked_mul(seconds_per_unit)
                .and_then(|v| total.checked_add(v))
                .ok_or(DurationParseError::Overflow)?;
        }
    }

    if pending.is_some() {
        return Err(DurationParseError::MissingUnit);
    }
    if total == 0 {
        return Err(DurationParseError::Zero);
    }
    Ok(Duration::from_secs(total))
}

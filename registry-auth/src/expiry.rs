//! Human-friendly token lifetimes: `30s`, `15m`, `2h`, `7d`.

use std::fmt;

/// Error returned when an expiry string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryError(pub String);

impl fmt::Display for ExpiryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid expiry '{}': expected a number followed by s, m, h or d",
            self.0
        )
    }
}

impl std::error::Error for ExpiryError {}

/// Parse an expiry string into minutes.
///
/// An empty string means the token never expires and yields `None`.
/// Fractional values are allowed (`1.5h`, `30s` is half a minute).
pub fn parse_expiry(input: &str) -> Result<Option<f64>, ExpiryError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let invalid = || ExpiryError(input.to_string());

    let unit_start = trimmed.len() - trimmed.chars().last().map_or(0, char::len_utf8);
    let (number, unit) = trimmed.split_at(unit_start);
    let value: f64 = number.trim().parse().map_err(|_| invalid())?;

    let minutes = match unit {
        "s" => value / 60.0,
        "m" => value,
        "h" => value * 60.0,
        "d" => value * 24.0 * 60.0,
        _ => return Err(invalid()),
    };
    if !minutes.is_finite() || minutes < 0.0 {
        return Err(invalid());
    }
    Ok(Some(minutes))
}

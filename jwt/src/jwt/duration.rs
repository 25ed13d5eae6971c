//! Duration shorthand parsing.
//!
//! Turns expressions such as `"30m"`, `"7d"`, `"1.5 hours"` or `"2 days ago"`
//! into a signed number of seconds.
//!
//! # Grammar
//!
//! ```text
//! [+|-][ ]<magnitude>[ ]<unit>[ ago| from now]
//! ```
//!
//! - `magnitude` is an integer (`12`) or a decimal (`1.5`, `.5`).
//! - `unit` is one of `s sec secs second seconds`, `m min mins minute minutes`,
//!   `h hr hrs hour hours`, `d day days`, `w week weeks`, `y yr yrs year years`.
//!   Matching is case-insensitive. A year is 365.25 days.
//! - A leading `-` or a trailing `ago` negates the result; they cannot be combined
//!   with each other, nor can a sign be combined with `from now`.
//!
//! # Invariants
//! - Parsing is pure: the same input always yields the same output.
//! - Results are rounded to the nearest whole second.

use thiserror::Error;

const MINUTE: f64 = 60.0;
const HOUR: f64 = MINUTE * 60.0;
const DAY: f64 = HOUR * 24.0;
const WEEK: f64 = DAY * 7.0;
const YEAR: f64 = DAY * 365.25;

/// Error returned when a duration expression cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    /// The expression does not follow the duration grammar.
    #[error("invalid duration expression '{0}'")]
    Invalid(String),
    /// The expression parsed but does not fit in a 64-bit second count.
    #[error("duration expression '{0}' is out of range")]
    OutOfRange(String),
}

/// Parse a duration expression into signed seconds.
///
/// # Errors
/// Returns `DurationError::Invalid` when the expression is malformed, and
/// `DurationError::OutOfRange` when the magnitude overflows.
pub fn parse(expression: &str) -> Result<i64, DurationError> {
    let invalid = || DurationError::Invalid(expression.to_string());

    let (sign, rest) = match expression.as_bytes().first() {
        Some(b'+') => (Some(Sign::Plus), &expression[1..]),
        Some(b'-') => (Some(Sign::Minus), &expression[1..]),
        _ => (None, expression),
    };
    let rest = rest.strip_prefix(' ').unwrap_or(rest);

    let magnitude_len = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let (magnitude, rest) = rest.split_at(magnitude_len);
    let value = parse_magnitude(magnitude).ok_or_else(invalid)?;

    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    let unit_len = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    let (unit, suffix) = rest.split_at(unit_len);
    let unit_seconds = unit_seconds(&unit.to_ascii_lowercase()).ok_or_else(invalid)?;

    let suffix = suffix.to_ascii_lowercase();
    let ago = match suffix.as_str() {
        "" => false,
        " ago" => true,
        " from now" => false,
        _ => return Err(invalid()),
    };
    if sign.is_some() && !suffix.is_empty() {
        return Err(invalid());
    }

    let seconds = (value * unit_seconds).round();
    // i64::MAX is not exactly representable; anything at or above 2^63 overflows.
    #[allow(clippy::cast_precision_loss)]
    let limit = i64::MAX as f64;
    if !seconds.is_finite() || seconds >= limit {
        return Err(DurationError::OutOfRange(expression.to_string()));
    }
    #[allow(clippy::cast_possible_truncation)]
    let seconds = seconds as i64;

    if ago || sign == Some(Sign::Minus) {
        Ok(-seconds)
    } else {
        Ok(seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Plus,
    Minus,
}

/// Accepts `\d+` or `\d*\.\d+`.
fn parse_magnitude(magnitude: &str) -> Option<f64> {
    let (whole, fraction) = match magnitude.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (magnitude, None),
    };
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let well_formed = match fraction {
        None => !whole.is_empty() && digits(whole),
        Some(fraction) => !fraction.is_empty() && digits(whole) && digits(fraction),
    };
    if !well_formed {
        return None;
    }
    magnitude.parse::<f64>().ok()
}

fn unit_seconds(unit: &str) -> Option<f64> {
    let seconds = match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "week" | "weeks" => WEEK,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR,
        _ => return None,
    };
    Some(seconds)
}

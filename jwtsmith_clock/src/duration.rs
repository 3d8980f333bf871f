//! Human duration strings, such as `"90s"`, `"1h30m"` or `"7d"`

use std::{convert::TryFrom, time::Duration};

use thiserror::Error;

const NANOS_PER_SEC: u128 = 1_000_000_000;
const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// A duration string that could not be parsed, or that was negative
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid duration '{input}': {reason}")]
pub struct InvalidDuration {
    input: String,
    reason: &'static str,
}

impl InvalidDuration {
    /// The rejected input
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Why the input was rejected
    #[must_use]
    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

fn invalid(input: &str, reason: &'static str) -> InvalidDuration {
    InvalidDuration {
        input: input.to_owned(),
        reason,
    }
}

/// Parses a human duration string
///
/// * The empty string is a zero duration, meaning "unset".
/// * A string ending in `d` is a whole, positive number of days, e.g. `7d`.
/// * Anything else is a sequence of decimal numbers, each with an optional
///   fraction and a unit suffix: `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`.
///   For example `300ms`, `1.5h` or `2h45m`. The bare string `0` is zero.
///
/// Negative durations are always rejected.
///
/// # Errors
///
/// The string does not follow the grammar above, is negative, or does not
/// fit in a [`Duration`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use jwtsmith_clock::parse_duration;
///
/// assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(7 * 24 * 3600));
/// assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(90 * 60));
/// assert_eq!(parse_duration("").unwrap(), Duration::from_secs(0));
/// assert!(parse_duration("-1h").is_err());
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, InvalidDuration> {
    if s.is_empty() {
        return Ok(Duration::from_secs(0));
    }

    match s.strip_suffix('d') {
        Some(days) => parse_days(s, days),
        None => parse_units(s),
    }
}

fn parse_days(input: &str, days: &str) -> Result<Duration, InvalidDuration> {
    if days.is_empty() || !days.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(input, "expected a whole number of days"));
    }

    let days: u64 = days
        .parse()
        .map_err(|_| invalid(input, "too many days"))?;

    if days == 0 {
        return Err(invalid(input, "number of days must be positive"));
    }

    days.checked_mul(SECS_PER_DAY)
        .map(Duration::from_secs)
        .ok_or_else(|| invalid(input, "too many days"))
}

fn parse_units(input: &str) -> Result<Duration, InvalidDuration> {
    let (negative, mut rest) = if let Some(r) = input.strip_prefix('-') {
        (true, r)
    } else if let Some(r) = input.strip_prefix('+') {
        (false, r)
    } else {
        (false, input)
    };

    if rest == "0" {
        return Ok(Duration::from_secs(0));
    }

    if rest.is_empty() {
        return Err(invalid(input, "expected a number"));
    }

    let mut total: u128 = 0;

    while !rest.is_empty() {
        let (whole, tail) = split_digits(rest);
        let (fraction, tail) = match tail.strip_prefix('.') {
            Some(t) => split_digits(t),
            None => ("", tail),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid(input, "expected a number"));
        }

        let unit_len = tail
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or_else(|| tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let scale = match unit {
            "" => return Err(invalid(input, "missing unit")),
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 60 * 60 * NANOS_PER_SEC,
            _ => return Err(invalid(input, "unknown unit")),
        };

        let term = term_nanos(whole, fraction, scale).ok_or_else(|| invalid(input, "overflow"))?;
        total = total
            .checked_add(term)
            .ok_or_else(|| invalid(input, "overflow"))?;

        rest = tail;
    }

    if negative && total != 0 {
        return Err(invalid(input, "negative durations are not allowed"));
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| invalid(input, "overflow"))?;
    let nanos = u32::try_from(total % NANOS_PER_SEC).map_err(|_| invalid(input, "overflow"))?;

    Ok(Duration::new(secs, nanos))
}

fn split_digits(s: &str) -> (&str, &str) {
    let len = s.bytes().take_while(u8::is_ascii_digit).count();
    s.split_at(len)
}

/// Nanoseconds in `<whole>.<fraction>` units of `scale` nanoseconds
fn term_nanos(whole: &str, fraction: &str, scale: u128) -> Option<u128> {
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };

    let mut nanos = whole.checked_mul(scale)?;

    // Digits past the nanosecond resolution of the largest unit cannot
    // contribute, so only the leading digits are kept.
    let fraction = &fraction[..fraction.len().min(15)];
    if !fraction.is_empty() {
        let numerator: u128 = fraction.parse().ok()?;
        let denominator = 10_u128.pow(u32::try_from(fraction.len()).ok()?);
        nanos = nanos.checked_add(numerator * scale / denominator)?;
    }

    Some(nanos)
}

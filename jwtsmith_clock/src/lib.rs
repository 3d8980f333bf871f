//! Timing utilities for token lifetimes
//!
//! Types included describe "now" through the [`Clock`] trait, so that
//! time-sensitive checks can be driven by a [`TestClock`] in tests, and
//! absolute instants as [`UnixTime`] seconds, the unit used by the
//! `exp`, `nbf` and `iat` claims.
//!
//! Relative lifetimes such as `"1h30m"` or `"7d"` are handled by
//! [`parse_duration()`].
//!
//! ```
//! use std::time::Duration;
//! use jwtsmith_clock::{parse_duration, Clock, TestClock, UnixTime};
//!
//! let clock = TestClock::new(UnixTime(1_700_000_000));
//! let lifetime = parse_duration("1h30m").unwrap();
//! assert_eq!(lifetime, Duration::from_secs(90 * 60));
//!
//! let exp = clock.now().checked_add(lifetime).unwrap();
//! assert_eq!(exp, UnixTime(1_700_005_400));
//! ```

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_must_use
)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::{
    convert::TryFrom,
    fmt,
    str::FromStr,
    time::{Duration, SystemTime},
};

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

mod duration;

pub use duration::{parse_duration, InvalidDuration};

/// Unix time
///
/// Unix time as represented by the number of seconds elapsed since the
/// beginning of the Unix epoch on 1970/01/01 at 00:00:00 UTC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct UnixTime(pub u64);

impl UnixTime {
    /// Adds a duration, truncated to whole seconds
    ///
    /// Returns `None` on overflow.
    #[must_use]
    pub fn checked_add(self, duration: Duration) -> Option<Self> {
        self.0.checked_add(duration.as_secs()).map(Self)
    }

    /// The time remaining from `self` until `later`
    ///
    /// Returns `None` if `later` is before `self`.
    #[must_use]
    pub fn duration_until(self, later: UnixTime) -> Option<Duration> {
        later.0.checked_sub(self.0).map(Duration::from_secs)
    }

    /// Parses either a decimal count of Unix seconds or an RFC 3339 timestamp
    ///
    /// # Errors
    ///
    /// The input is neither form, or names an instant before the Unix epoch.
    pub fn parse(s: &str) -> Result<Self, InvalidTimestamp> {
        let s = s.trim();

        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse::<u64>()
                .map(Self)
                .map_err(|_| invalid_timestamp(s));
        }

        Self::parse_rfc3339(s)
    }

    /// Parses an RFC 3339 timestamp, such as `2024-01-02T03:04:05Z`
    ///
    /// Fractional seconds are truncated.
    ///
    /// # Errors
    ///
    /// The input is not RFC 3339, or names an instant before the Unix epoch.
    pub fn parse_rfc3339(s: &str) -> Result<Self, InvalidTimestamp> {
        let parsed = DateTime::parse_from_rfc3339(s).map_err(|_| invalid_timestamp(s))?;
        u64::try_from(parsed.timestamp())
            .map(Self)
            .map_err(|_| invalid_timestamp(s))
    }

    /// Formats this instant as an RFC 3339 timestamp in UTC
    ///
    /// Returns `None` for instants too far in the future to be represented.
    #[must_use]
    pub fn to_rfc3339(self) -> Option<String> {
        let secs = i64::try_from(self.0).ok()?;
        let dt: DateTime<Utc> = DateTime::from_timestamp(secs, 0)?;
        Some(dt.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl From<SystemTime> for UnixTime {
    #[inline]
    fn from(t: SystemTime) -> Self {
        // Clocks set before 1970 are treated as the epoch itself.
        let time = t
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        UnixTime(time)
    }
}

impl FromStr for UnixTime {
    type Err = InvalidTimestamp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UnixTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A timestamp that is neither Unix seconds nor RFC 3339
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("'{input}' is neither a Unix timestamp nor an RFC 3339 date-time")]
pub struct InvalidTimestamp {
    input: String,
}

impl InvalidTimestamp {
    /// The rejected input
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

fn invalid_timestamp(input: &str) -> InvalidTimestamp {
    InvalidTimestamp {
        input: input.to_owned(),
    }
}

/// Represents a clock, which can tell the current time
pub trait Clock {
    /// Gets the current time according to this clock
    fn now(&self) -> UnixTime;
}

impl<C: Clock + ?Sized> Clock for &'_ C {
    #[inline]
    fn now(&self) -> UnixTime {
        C::now(&**self)
    }
}

/// The system clock as provided by `std::time::SystemTime`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct System;

impl Clock for System {
    #[inline]
    fn now(&self) -> UnixTime {
        UnixTime::from(SystemTime::now())
    }
}

/// A test clock which maintains the current time as internal state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestClock(UnixTime);

impl Clock for TestClock {
    #[inline]
    fn now(&self) -> UnixTime {
        self.0
    }
}

impl TestClock {
    /// Creates a new test clock with the specified time
    #[inline]
    pub const fn new(time: UnixTime) -> Self {
        Self(time)
    }

    /// Updates the clock's current time to `val`
    pub fn set(&mut self, val: UnixTime) {
        self.0 = val;
    }

    /// Moves the clock forward by `by`, truncated to whole seconds
    pub fn advance(&mut self, by: Duration) {
        (self.0).0 = (self.0).0.saturating_add(by.as_secs());
    }
}

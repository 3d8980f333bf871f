//! Expiration inspection without key material
//!
//! The token is decoded structurally and its `exp` claim compared with the
//! current time. The signature is not checked, so the result says nothing
//! about whether the token can be trusted, only whether it has lapsed.

use std::time::Duration;

use jwtsmith_clock::{Clock, System, UnixTime};

use crate::{
    error::{InvalidFormat, JwtError},
    jwt::{self, CoreClaims},
};

/// The `exp` claim of a token, compared with the time of the check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Expiration {
    expires_at: UnixTime,
    checked_at: UnixTime,
}

impl Expiration {
    /// When the token expires
    #[must_use]
    pub fn expires_at(&self) -> UnixTime {
        self.expires_at
    }

    /// When the check was made
    #[must_use]
    pub fn checked_at(&self) -> UnixTime {
        self.checked_at
    }

    /// Whether `exp` had passed at the time of the check
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at < self.checked_at
    }

    /// Time left before expiry, if not yet expired
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.checked_at.duration_until(self.expires_at)
    }

    /// Time since expiry, if expired
    #[must_use]
    pub fn expired_for(&self) -> Option<Duration> {
        if self.is_expired() {
            self.expires_at.duration_until(self.checked_at)
        } else {
            None
        }
    }
}

/// The result of an expiration check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct ExpirationStatus {
    expiry: Option<Expiration>,
}

impl ExpirationStatus {
    /// Whether the token has an `exp` claim
    #[must_use]
    pub fn has_exp(&self) -> bool {
        self.expiry.is_some()
    }

    /// The expiration details, if the token has an `exp` claim
    #[must_use]
    pub fn expiry(&self) -> Option<&Expiration> {
        self.expiry.as_ref()
    }

    /// Whether the token has expired; `None` without an `exp` claim
    #[must_use]
    pub fn is_expired(&self) -> Option<bool> {
        self.expiry.map(|e| e.is_expired())
    }

    /// Time left before expiry; `None` if expired or without an `exp` claim
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.expiry.and_then(|e| e.remaining())
    }
}

/// Checks a token's `exp` claim against the system clock
///
/// # Errors
///
/// The token is malformed, or its `exp` claim is present but is not a Unix
/// timestamp.
pub fn check_expiration(token: &str) -> Result<ExpirationStatus, JwtError> {
    check_expiration_with_clock(token, &System)
}

/// Checks a token's `exp` claim against `clock`
///
/// `nbf` is ignored.
///
/// # Errors
///
/// See [`check_expiration()`].
pub fn check_expiration_with_clock<C: Clock>(
    token: &str,
    clock: &C,
) -> Result<ExpirationStatus, JwtError> {
    let decoded = jwt::decode(token)?;
    let exp = decoded.claims().exp().map_err(InvalidFormat::from)?;

    Ok(ExpirationStatus {
        expiry: exp.map(|expires_at| Expiration {
            expires_at,
            checked_at: clock.now(),
        }),
    })
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use jwtsmith_clock::TestClock;

    use super::*;
    use crate::error::ErrorKind;

    const TOKEN: &str = concat!(
        "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.",
        "eyJzdWIiOiJ1MSIsImF1ZCI6WyJhcGkiLCJ3ZWIiXSwiaXNzIjoiaXNzdWVyIiwiZXhwIjoiMTcwMDAwMzYwMCIsIm5iZiI6MTY5OTk5OTk5OS43NX0.",
        "fs2PMsG1MwJ7M30HUVEnRTTWshYlWP2xyQsKhl-RDp8"
    );

    const EXP: u64 = 1_700_003_600;

    fn at(secs: u64) -> TestClock {
        TestClock::new(UnixTime(secs))
    }

    #[test]
    fn live_token_reports_remaining_time() -> Result<()> {
        let status = check_expiration_with_clock(TOKEN, &at(EXP - 90))?;

        assert!(status.has_exp());
        assert_eq!(status.is_expired(), Some(false));
        assert_eq!(status.remaining(), Some(Duration::from_secs(90)));
        assert_eq!(
            status.expiry().map(Expiration::expires_at),
            Some(UnixTime(EXP))
        );
        Ok(())
    }

    #[test]
    fn expired_token_reports_elapsed_time() -> Result<()> {
        let status = check_expiration_with_clock(TOKEN, &at(EXP + 60))?;

        assert_eq!(status.is_expired(), Some(true));
        assert_eq!(status.remaining(), None);
        assert_eq!(
            status.expiry().and_then(Expiration::expired_for),
            Some(Duration::from_secs(60))
        );
        Ok(())
    }

    #[test]
    fn expiry_instant_is_still_live() -> Result<()> {
        let status = check_expiration_with_clock(TOKEN, &at(EXP))?;
        assert_eq!(status.is_expired(), Some(false));
        assert_eq!(status.remaining(), Some(Duration::from_secs(0)));
        Ok(())
    }

    #[test]
    fn ignores_not_before() -> Result<()> {
        let status = check_expiration_with_clock(TOKEN, &at(0))?;
        assert_eq!(status.is_expired(), Some(false));
        Ok(())
    }

    #[test]
    fn absent_exp_is_reported() -> Result<()> {
        let token = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ1MSJ9.c2ln";
        let status = check_expiration(token)?;
        assert!(!status.has_exp());
        assert_eq!(status.is_expired(), None);
        assert_eq!(status.remaining(), None);
        Ok(())
    }

    #[test]
    fn unreadable_exp_is_invalid_format() {
        // {"exp":"soon"}
        let token = "eyJhbGciOiJIUzI1NiJ9.eyJleHAiOiJzb29uIn0.c2ln";
        let err = check_expiration(token).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn malformed_token() {
        let err = check_expiration("only.two").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedToken);
    }
}

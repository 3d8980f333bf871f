//! Common errors
//!
//! Hard failures abort an operation and surface as a [`JwtError`]. Each
//! [`ErrorKind`] carries a distinct process exit code so that scripted callers
//! can branch without parsing messages. A token that merely fails verification
//! is *not* an error; see [`Outcome`][crate::verify::Outcome].

#![allow(missing_copy_implementations)]

use std::{convert::Infallible, error::Error as StdError, fmt, io, path::PathBuf};

use jwtsmith_clock::{InvalidDuration, InvalidTimestamp};
use thiserror::Error;

use crate::jws;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The broad class of a hard failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The token could not be split and decoded into header, payload and signature
    MalformedToken,

    /// The requested or declared algorithm is not supported
    UnsupportedAlgorithm,

    /// Credentials were missing, inconsistent with the algorithm, or unusable
    KeyLoad,

    /// A duration, timestamp, claim, or JSON payload could not be parsed
    InvalidFormat,
}

impl ErrorKind {
    /// The process exit code associated with this kind of failure
    ///
    /// `0` and `1` are left to the caller for success and for a token that
    /// failed verification.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::MalformedToken => 3,
            Self::UnsupportedAlgorithm => 4,
            Self::KeyLoad => 5,
            Self::InvalidFormat => 6,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::MalformedToken => "malformed token",
            Self::UnsupportedAlgorithm => "unsupported algorithm",
            Self::KeyLoad => "key load failure",
            Self::InvalidFormat => "invalid format",
        };

        f.write_str(s)
    }
}

/// A hard failure of a decode, verify, create, or expiration check
#[derive(Debug, Error)]
pub enum JwtError {
    /// The token is structurally malformed
    #[error(transparent)]
    MalformedToken(#[from] MalformedToken),

    /// The algorithm is missing or not supported
    #[error(transparent)]
    UnsupportedAlgorithm(#[from] UnsupportedAlgorithm),

    /// Key material could not be resolved
    #[error(transparent)]
    KeyLoad(#[from] KeyLoad),

    /// An input could not be parsed
    #[error(transparent)]
    InvalidFormat(#[from] InvalidFormat),
}

impl JwtError {
    /// The class of this failure
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedToken(_) => ErrorKind::MalformedToken,
            Self::UnsupportedAlgorithm(_) => ErrorKind::UnsupportedAlgorithm,
            Self::KeyLoad(_) => ErrorKind::KeyLoad,
            Self::InvalidFormat(_) => ErrorKind::InvalidFormat,
        }
    }

    /// The process exit code for this failure
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

/// The JWT is malformed and cannot be parsed out into header, payload, and signature sections
#[derive(Debug, Error)]
pub enum MalformedToken {
    /// The token does not have exactly three `.`-separated segments
    #[error("malformed JWT: expected 3 segments, found {found}")]
    SegmentCount {
        /// The number of segments present
        found: usize,
    },

    /// The header segment is not base64url-encoded JSON object
    #[error("malformed JWT header")]
    Header(#[source] BoxError),

    /// The payload segment is not base64url-encoded JSON object
    #[error("malformed JWT payload")]
    Payload(#[source] BoxError),

    /// The signature segment is not base64url-encoded
    #[error("malformed JWT signature")]
    Signature(#[source] BoxError),
}

pub(crate) fn malformed_jwt(found: usize) -> MalformedToken {
    MalformedToken::SegmentCount { found }
}

pub(crate) fn malformed_jwt_header(source: impl Into<BoxError>) -> MalformedToken {
    MalformedToken::Header(source.into())
}

pub(crate) fn malformed_jwt_payload(source: impl Into<BoxError>) -> MalformedToken {
    MalformedToken::Payload(source.into())
}

pub(crate) fn malformed_jwt_signature(source: impl Into<BoxError>) -> MalformedToken {
    MalformedToken::Signature(source.into())
}

/// The algorithm could not be matched with supported algorithms
#[derive(Debug, Error)]
pub enum UnsupportedAlgorithm {
    /// The name does not match any registered algorithm
    #[error("'{0}' does not match supported algorithms")]
    Unknown(String),

    /// The token header has no usable `alg`
    #[error("token header does not name an algorithm")]
    Missing,
}

#[inline]
pub(crate) fn unknown_algorithm(alg: impl Into<String>) -> UnsupportedAlgorithm {
    UnsupportedAlgorithm::Unknown(alg.into())
}

/// The key cannot be used with the requested algorithm
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("key incompatible with algorithm '{alg}'")]
pub struct IncompatibleAlgorithm {
    alg: jws::Algorithm,
}

#[inline]
pub(crate) fn incompatible_algorithm(alg: impl Into<jws::Algorithm>) -> IncompatibleAlgorithm {
    IncompatibleAlgorithm { alg: alg.into() }
}

/// The key was rejected
#[derive(Debug, Error)]
#[error("key rejected")]
pub struct KeyRejected {
    #[from]
    source: BoxError,
}

pub(crate) fn key_rejected(source: impl Into<BoxError>) -> KeyRejected {
    KeyRejected {
        source: source.into(),
    }
}

/// The signature did not match
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("signature mismatch")]
pub struct SignatureMismatch {
    _p: (),
}

pub(crate) const fn signature_mismatch() -> SignatureMismatch {
    SignatureMismatch { _p: () }
}

/// Unexpected error (possibly a bug)
#[derive(Debug, Error)]
#[error("unexpected error")]
pub struct Unexpected {
    #[from]
    source: BoxError,
}

pub(crate) fn unexpected(source: impl Into<BoxError>) -> Unexpected {
    Unexpected {
        source: source.into(),
    }
}

/// A temporal claim is present but is not a Unix timestamp
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("the '{claim}' claim is not a valid Unix timestamp")]
pub struct InvalidClaim {
    claim: &'static str,
}

impl InvalidClaim {
    /// The name of the offending claim
    #[must_use]
    pub fn claim(&self) -> &'static str {
        self.claim
    }
}

pub(crate) const fn invalid_claim(claim: &'static str) -> InvalidClaim {
    InvalidClaim { claim }
}

/// Key material could not be resolved for an operation
#[derive(Debug, Error)]
pub enum KeyLoad {
    /// Neither a secret nor a key file was supplied
    #[error("no credentials supplied; provide a shared secret or a PEM key file")]
    MissingCredentials,

    /// A shared secret was supplied for an RSA or ECDSA algorithm
    #[error("{alg} requires a PEM key file, but a shared secret was supplied")]
    SecretForAsymmetric {
        /// The requested algorithm
        alg: jws::Algorithm,
    },

    /// A key file was supplied for an HMAC algorithm
    #[error("{alg} requires a shared secret, but a key file was supplied")]
    KeyFileForHmac {
        /// The requested algorithm
        alg: jws::Algorithm,
    },

    /// The key file could not be read
    #[error("unable to read key file '{}'", .path.display())]
    Unreadable {
        /// The path that was read
        path: PathBuf,
        /// The I/O failure
        #[source]
        source: io::Error,
    },

    /// The key file is not PEM key material that the backend accepts
    #[error("unable to load PEM key from '{}'", .path.display())]
    Pem {
        /// The path that was read
        path: PathBuf,
        /// Why the key was rejected
        #[source]
        source: KeyRejected,
    },

    /// The PEM holds a key for a different algorithm family
    #[error("{alg} requires {} key material, but the PEM holds {found}", .alg.family())]
    WrongKeyType {
        /// The requested algorithm
        alg: jws::Algorithm,
        /// A description of the key found
        found: &'static str,
    },

    /// The key belongs to the right family but cannot be used with the algorithm
    #[error(transparent)]
    Incompatible(#[from] IncompatibleAlgorithm),

    /// The key was rejected by the crypto backend
    #[error(transparent)]
    Rejected(#[from] KeyRejected),

    /// The key failed to produce a signature
    #[error("key could not produce a signature")]
    Signing(#[source] SigningError),
}

/// An input could not be parsed
#[derive(Debug, Error)]
pub enum InvalidFormat {
    /// A lifetime for `exp` or `nbf` is not a valid duration
    #[error("invalid '{claim}' lifetime")]
    Duration {
        /// The claim being computed
        claim: &'static str,
        /// The parse failure
        #[source]
        source: InvalidDuration,
    },

    /// A lifetime for `exp` or `nbf` is zero
    #[error("'{claim}' lifetime must be positive")]
    NonPositiveDuration {
        /// The claim being computed
        claim: &'static str,
    },

    /// A lifetime pushes the claim past the representable range
    #[error("'{claim}' lifetime is out of range")]
    TimeOverflow {
        /// The claim being computed
        claim: &'static str,
    },

    /// The `iat` input is neither a Unix timestamp nor RFC 3339
    #[error(transparent)]
    Timestamp(#[from] InvalidTimestamp),

    /// The complete claims payload is not a JSON object
    #[error("claims JSON is not a valid JSON object")]
    ClaimsJson(#[source] serde_json::Error),

    /// A free-form claim is not of the form `key=value`
    #[error("claim '{0}' is not of the form key=value")]
    ClaimPair(String),

    /// A temporal claim in a token is not a Unix timestamp
    #[error(transparent)]
    Claim(#[from] InvalidClaim),
}

pub(crate) fn invalid_duration(claim: &'static str, source: InvalidDuration) -> InvalidFormat {
    InvalidFormat::Duration { claim, source }
}

/// An error occurring while creating a signature
#[derive(Debug, Error)]
pub enum SigningError {
    /// The key cannot be used with this algorithm
    #[error(transparent)]
    IncompatibleAlgorithm(#[from] IncompatibleAlgorithm),

    /// An unexpected error
    #[error(transparent)]
    Unexpected(#[from] Unexpected),
}

impl From<Infallible> for SigningError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// An error occurring while verifying a signature
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The key cannot be used with this algorithm
    #[error(transparent)]
    IncompatibleAlgorithm(#[from] IncompatibleAlgorithm),

    /// Signature is invalid
    #[error(transparent)]
    SignatureMismatch(#[from] SignatureMismatch),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_and_reserved_codes_are_unused() {
        let kinds = [
            ErrorKind::MalformedToken,
            ErrorKind::UnsupportedAlgorithm,
            ErrorKind::KeyLoad,
            ErrorKind::InvalidFormat,
        ];

        let mut codes: Vec<i32> = kinds.iter().map(|k| k.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();

        assert_eq!(codes.len(), kinds.len());
        assert!(codes.iter().all(|&c| c > 1));
    }

    #[test]
    fn jwt_error_reports_kind_and_cause() {
        let err = JwtError::from(malformed_jwt_payload("not json"));
        assert_eq!(err.kind(), ErrorKind::MalformedToken);
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "malformed JWT payload");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("not json"));
    }

    #[test]
    fn key_load_messages_name_the_algorithm() {
        let err = KeyLoad::SecretForAsymmetric {
            alg: jws::Algorithm::RS256,
        };
        assert_eq!(
            err.to_string(),
            "RS256 requires a PEM key file, but a shared secret was supplied"
        );

        let err = KeyLoad::WrongKeyType {
            alg: jws::Algorithm::ES384,
            found: "an RSA key",
        };
        assert_eq!(
            err.to_string(),
            "ES384 requires ECDSA key material, but the PEM holds an RSA key"
        );
    }
}

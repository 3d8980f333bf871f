//! Cryptographic and temporal verification of tokens
//!
//! Verification has two return channels. A token that cannot be processed at
//! all (it is malformed, names an unsupported algorithm, or the credentials
//! cannot be loaded) is a hard failure, reported as a [`JwtError`]. A token
//! that is processed but does not hold up (bad signature, expired, not yet
//! valid) is a completed verification with an [`Outcome::Invalid`].
//!
//! ```
//! use jwtsmith::{verify::Verifier, Credentials, TestClock, UnixTime};
//!
//! let token = concat!(
//!     "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.",
//!     "eyJzdWIiOiJ1MSIsImF1ZCI6WyJhcGkiLCJ3ZWIiXSwiaXNzIjoiaXNzdWVyIiwiZXhwIjoiMTcwMDAwMzYwMCIsIm5iZiI6MTY5OTk5OTk5OS43NX0.",
//!     "fs2PMsG1MwJ7M30HUVEnRTTWshYlWP2xyQsKhl-RDp8"
//! );
//!
//! let verifier = Verifier::new().with_clock(TestClock::new(UnixTime(1_700_000_000)));
//! let verification = verifier.verify(token, &Credentials::from_secret("s3cret")).unwrap();
//! assert!(verification.is_valid());
//!
//! let verification = verifier.verify(token, &Credentials::from_secret("guess")).unwrap();
//! assert!(!verification.is_valid());
//! assert_eq!(verification.outcome().exit_code(), 1);
//! ```

use jwtsmith_clock::{Clock, System, UnixTime};
use thiserror::Error;

use crate::{
    error::{self, JwtError, KeyLoad, VerifyError},
    jwt::{self, Claims, CoreClaims, Header},
    key::Credentials,
    registry::Registry,
};

/// Why a token failed verification
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Failure {
    /// The signature does not match the header and payload
    #[error("signature does not match")]
    SignatureMismatch,

    /// The `exp` claim is in the past
    #[error("token expired at {exp}")]
    Expired {
        /// The token's `exp` claim
        exp: UnixTime,
    },

    /// The `nbf` claim is in the future
    #[error("token is not valid before {nbf}")]
    NotYetValid {
        /// The token's `nbf` claim
        nbf: UnixTime,
    },

    /// A temporal claim could not be read
    #[error(transparent)]
    InvalidClaim(#[from] error::InvalidClaim),
}

/// The terminal state of a completed verification
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum Outcome {
    /// The signature matched and the token is within its validity window
    Valid,

    /// The token did not hold up
    Invalid(Failure),
}

impl Outcome {
    /// Whether the token is valid
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The failure, if the token is invalid
    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Valid => None,
            Self::Invalid(failure) => Some(failure),
        }
    }

    /// The process exit code for this outcome: `0` if valid, `1` otherwise
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Valid => 0,
            Self::Invalid(_) => 1,
        }
    }
}

/// A completed verification
///
/// The decoded header and claims are returned whether or not the token is
/// valid. Unless [`is_valid()`][Self::is_valid] is `true`, they must not be
/// trusted.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Verification {
    header: Header,
    claims: Claims,
    outcome: Outcome,
}

impl Verification {
    /// The token's header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The token's claims
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// The verification outcome
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Whether the token is valid
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.outcome.is_valid()
    }

    /// Extracts the header, claims and outcome
    pub fn into_parts(self) -> (Header, Claims, Outcome) {
        (self.header, self.claims, self.outcome)
    }
}

/// Checks token signatures and validity windows
///
/// There is no tolerance for clock skew.
#[derive(Clone, Copy, Debug)]
#[must_use]
pub struct Verifier<'r, C = System> {
    registry: &'r Registry,
    clock: C,
}

impl Default for Verifier<'static, System> {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier<'static, System> {
    /// A verifier over every supported algorithm, using the system clock
    pub fn new() -> Self {
        Self {
            registry: Registry::global(),
            clock: System,
        }
    }
}

impl<'r, C: Clock> Verifier<'r, C> {
    /// Resolves algorithms through `registry`
    pub fn with_registry<'s>(self, registry: &'s Registry) -> Verifier<'s, C> {
        Verifier {
            registry,
            clock: self.clock,
        }
    }

    /// Reads the current time from `clock`
    pub fn with_clock<D: Clock>(self, clock: D) -> Verifier<'r, D> {
        Verifier {
            registry: self.registry,
            clock,
        }
    }

    /// Verifies `token` with the key material in `credentials`
    ///
    /// # Errors
    ///
    /// * The token is malformed.
    /// * The header `alg` is missing, not a string, or not registered.
    /// * The credentials are missing, do not fit the algorithm, or cannot
    ///   be loaded.
    pub fn verify(&self, token: &str, credentials: &Credentials) -> Result<Verification, JwtError> {
        let decoded = jwt::decode(token)?;

        let alg = decoded
            .header()
            .alg()
            .ok_or(error::UnsupportedAlgorithm::Missing)?;
        let method = self.registry.resolve(alg)?;
        let key = credentials.verifying_key(method.algorithm())?;

        let signature_ok = match decoded.signature_bytes() {
            Ok(signature) => {
                match method.verify(&key, decoded.message().as_bytes(), &signature) {
                    Ok(()) => true,
                    Err(VerifyError::SignatureMismatch(_)) => false,
                    Err(VerifyError::IncompatibleAlgorithm(e)) => {
                        return Err(KeyLoad::from(e).into())
                    }
                }
            }
            Err(_) => false,
        };

        let outcome = if signature_ok {
            check_temporal(decoded.claims(), self.clock.now())
        } else {
            Outcome::Invalid(Failure::SignatureMismatch)
        };

        #[cfg(feature = "tracing")]
        log_outcome(method, &outcome);

        let (header, claims) = decoded.into_parts();
        Ok(Verification {
            header,
            claims,
            outcome,
        })
    }
}

/// Verifies `token` against the global registry and the system clock
///
/// # Errors
///
/// See [`Verifier::verify()`].
pub fn verify(token: &str, credentials: &Credentials) -> Result<Verification, JwtError> {
    Verifier::new().verify(token, credentials)
}

#[cfg(feature = "tracing")]
fn log_outcome(method: &crate::registry::Descriptor, outcome: &Outcome) {
    match outcome {
        Outcome::Valid => tracing::debug!(jwt.alg = %method, "token verified"),
        Outcome::Invalid(failure) => {
            tracing::debug!(jwt.alg = %method, reason = %failure, "token rejected")
        }
    }
}

fn check_temporal(claims: &Claims, now: UnixTime) -> Outcome {
    let exp = match claims.exp() {
        Ok(exp) => exp,
        Err(e) => return Outcome::Invalid(e.into()),
    };

    if let Some(exp) = exp {
        if exp < now {
            return Outcome::Invalid(Failure::Expired { exp });
        }
    }

    let nbf = match claims.nbf() {
        Ok(nbf) => nbf,
        Err(e) => return Outcome::Invalid(e.into()),
    };

    if let Some(nbf) = nbf {
        if nbf > now {
            return Outcome::Invalid(Failure::NotYetValid { nbf });
        }
    }

    Outcome::Valid
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use jwtsmith_clock::TestClock;
    #[cfg(feature = "tracing")]
    use tracing_test::traced_test;

    use super::*;
    use crate::{
        error::ErrorKind,
        jws,
        jwt::{Jwt, SubjectRef},
        key::{self, SigningKey},
        test,
    };

    const TOKEN: &str = concat!(
        "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.",
        "eyJzdWIiOiJ1MSIsImF1ZCI6WyJhcGkiLCJ3ZWIiXSwiaXNzIjoiaXNzdWVyIiwiZXhwIjoiMTcwMDAwMzYwMCIsIm5iZiI6MTY5OTk5OTk5OS43NX0.",
        "fs2PMsG1MwJ7M30HUVEnRTTWshYlWP2xyQsKhl-RDp8"
    );

    const EXP: UnixTime = UnixTime(1_700_003_600);
    const NBF: UnixTime = UnixTime(1_699_999_999);

    fn at(secs: u64) -> Verifier<'static, TestClock> {
        Verifier::new().with_clock(TestClock::new(UnixTime(secs)))
    }

    fn secret() -> Credentials {
        Credentials::from_secret(test::hmac::SECRET)
    }

    fn sign(header: &Header, claims: &Claims, key: &SigningKey) -> Result<Jwt> {
        let alg = header.alg().unwrap_or_default();
        let method = Registry::global().resolve(alg)?;
        Ok(Jwt::try_from_parts_with_signature(header, claims, method, key)?)
    }

    fn hmac_key() -> SigningKey {
        crate::jwa::Hmac::new(test::hmac::SECRET.as_bytes()).into()
    }

    #[test]
    #[cfg_attr(feature = "tracing", traced_test)]
    fn accepts_a_valid_token() -> Result<()> {
        let verification = at(1_700_000_000).verify(TOKEN, &secret())?;

        assert_eq!(verification.outcome(), &Outcome::Valid);
        assert_eq!(verification.outcome().exit_code(), 0);
        assert_eq!(verification.header().alg(), Some("HS256"));
        assert_eq!(
            verification.claims().sub().map(SubjectRef::as_str),
            Some("u1")
        );
        Ok(())
    }

    #[test]
    fn temporal_boundaries_are_inclusive() -> Result<()> {
        assert!(at(EXP.0).verify(TOKEN, &secret())?.is_valid());
        assert!(at(NBF.0).verify(TOKEN, &secret())?.is_valid());
        Ok(())
    }

    #[test]
    fn rejects_expired_tokens() -> Result<()> {
        let verification = at(EXP.0 + 1).verify(TOKEN, &secret())?;
        assert_eq!(
            verification.outcome(),
            &Outcome::Invalid(Failure::Expired { exp: EXP })
        );
        assert_eq!(verification.outcome().exit_code(), 1);
        Ok(())
    }

    #[test]
    fn rejects_tokens_not_yet_valid() -> Result<()> {
        let verification = at(NBF.0 - 1).verify(TOKEN, &secret())?;
        assert_eq!(
            verification.outcome(),
            &Outcome::Invalid(Failure::NotYetValid { nbf: NBF })
        );
        Ok(())
    }

    #[test]
    fn wrong_secret_is_a_mismatch_not_an_error() -> Result<()> {
        let verification = at(1_700_000_000).verify(TOKEN, &Credentials::from_secret("guess"))?;
        assert_eq!(
            verification.outcome().failure(),
            Some(&Failure::SignatureMismatch)
        );
        assert_eq!(
            verification.claims().sub().map(SubjectRef::as_str),
            Some("u1")
        );
        Ok(())
    }

    #[test]
    fn signature_is_checked_before_lifetime() -> Result<()> {
        let verification = at(EXP.0 + 1).verify(TOKEN, &Credentials::from_secret("guess"))?;
        assert_eq!(
            verification.outcome().failure(),
            Some(&Failure::SignatureMismatch)
        );
        Ok(())
    }

    #[test]
    fn every_flipped_signature_bit_is_a_mismatch() -> Result<()> {
        let (message, signature) = TOKEN.rsplit_once('.').unwrap();
        let mut raw = crate::b64::Base64Url::from_encoded(signature)?.into_inner();

        for bit in 0..raw.len() * 8 {
            raw[bit / 8] ^= 1 << (bit % 8);
            let tampered = format!("{}.{}", message, crate::b64::Base64Url::from_raw(raw.clone()));
            raw[bit / 8] ^= 1 << (bit % 8);

            let verification = at(1_700_000_000).verify(&tampered, &secret())?;
            assert_eq!(
                verification.outcome().failure(),
                Some(&Failure::SignatureMismatch),
                "bit {}",
                bit
            );
        }
        Ok(())
    }

    #[test]
    fn undecodable_signature_is_a_mismatch() -> Result<()> {
        let (message, _) = TOKEN.rsplit_once('.').unwrap();
        let token = format!("{}.{}", message, "%%%");
        let verification = at(1_700_000_000).verify(&token, &secret())?;
        assert_eq!(
            verification.outcome().failure(),
            Some(&Failure::SignatureMismatch)
        );
        Ok(())
    }

    #[test]
    fn unreadable_temporal_claim_is_invalid() -> Result<()> {
        let header = Header::new(jws::Algorithm::HS256);
        let claims = Claims::new().with("sub", "u1").with("exp", "soon");
        let token = sign(&header, &claims, &hmac_key())?;

        let verification = at(1_700_000_000).verify(token.as_str(), &secret())?;
        match verification.outcome().failure() {
            Some(Failure::InvalidClaim(e)) => assert_eq!(e.claim(), "exp"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn tokens_without_temporal_claims_do_not_expire() -> Result<()> {
        let header = Header::new(jws::Algorithm::HS384);
        let claims = Claims::new().with("sub", "u1");
        let token = sign(&header, &claims, &hmac_key())?;

        assert!(at(u64::MAX).verify(token.as_str(), &secret())?.is_valid());
        assert!(at(0).verify(token.as_str(), &secret())?.is_valid());
        Ok(())
    }

    #[test]
    fn verifies_rsa_tokens_with_a_public_key_file() -> Result<()> {
        let signer = key::private_key_from_pem(&test::rsa::PRIVATE_KEY_PKCS1, jws::Algorithm::PS256)?;
        let header = Header::new(jws::Algorithm::PS256);
        let claims = Claims::new().with("sub", "u1");
        let token = sign(&header, &claims, &signer)?;

        let public = test::pem_file(&test::rsa::PUBLIC_KEY);
        let verification = verify(token.as_str(), &Credentials::from_key_file(public.path()))?;
        assert!(verification.is_valid());
        Ok(())
    }

    #[test]
    fn verifies_es512_tokens_with_a_public_key_file() -> Result<()> {
        let signer = key::private_key_from_pem(&test::ec::P521_PRIVATE_KEY, jws::Algorithm::ES512)?;
        let header = Header::new(jws::Algorithm::ES512);
        let token = sign(&header, &Claims::new(), &signer)?;

        let public = test::pem_file(&test::ec::P521_PUBLIC_KEY);
        let verification = verify(token.as_str(), &Credentials::from_key_file(public.path()))?;
        assert!(verification.is_valid());
        Ok(())
    }

    #[test]
    fn missing_algorithm_is_unsupported() {
        let token = concat!("eyJ0eXAiOiJKV1QifQ.", "eyJzdWIiOiJ1MSJ9.", "c2ln");
        let err = verify(token, &secret()).unwrap_err();
        assert!(matches!(
            err,
            JwtError::UnsupportedAlgorithm(error::UnsupportedAlgorithm::Missing)
        ));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn unknown_algorithm_is_unsupported() {
        let token = concat!(
            "eyJhbGciOiJub25lIn0.",
            "eyJzdWIiOiJ1MSJ9.",
            "c2ln"
        );
        let err = verify(token, &secret()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedAlgorithm);
    }

    #[test]
    fn restricted_registry_refuses_other_algorithms() {
        let registry = Registry::with_algorithms(vec![jws::Algorithm::RS256]);
        let err = at(1_700_000_000)
            .with_registry(&registry)
            .verify(TOKEN, &secret())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedAlgorithm);
    }

    #[test]
    fn malformed_tokens_are_hard_failures() {
        let err = verify("abc.def", &secret()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedToken);
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn wrong_credential_family_is_a_key_load_failure() -> Result<()> {
        let public = test::pem_file(&test::rsa::PUBLIC_KEY);
        let err = verify(TOKEN, &Credentials::from_key_file(public.path())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeyLoad);

        let err = verify(TOKEN, &Credentials::new()).unwrap_err();
        assert!(matches!(err, JwtError::KeyLoad(KeyLoad::MissingCredentials)));
        assert_eq!(err.exit_code(), 5);
        Ok(())
    }
}

//! Implementations of the JSON Web Signature (JWS) standard
//!
//! The specifications for this standard can be found in [RFC7515][].
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515

use std::{convert::TryFrom, error::Error as StdError, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error, jwa};

/// JSON Web Signature signing algorithms
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Algorithm {
    /// HMAC symmetric
    Hmac(jwa::hmac::SigningAlgorithm),

    /// RSA public/private key pair
    Rsa(jwa::rsa::SigningAlgorithm),

    /// Elliptic curve cryptography
    EllipticCurve(jwa::ec::SigningAlgorithm),
}

impl Algorithm {
    /// The HS256 signing algorithm
    pub const HS256: Algorithm = Self::Hmac(jwa::hmac::SigningAlgorithm::HS256);
    /// The HS384 signing algorithm
    pub const HS384: Algorithm = Self::Hmac(jwa::hmac::SigningAlgorithm::HS384);
    /// The HS512 signing algorithm
    pub const HS512: Algorithm = Self::Hmac(jwa::hmac::SigningAlgorithm::HS512);

    /// The RS256 signing algorithm
    pub const RS256: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::RS256);
    /// The RS384 signing algorithm
    pub const RS384: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::RS384);
    /// The RS512 signing algorithm
    pub const RS512: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::RS512);
    /// The PS256 signing algorithm
    pub const PS256: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::PS256);
    /// The PS384 signing algorithm
    pub const PS384: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::PS384);
    /// The PS512 signing algorithm
    pub const PS512: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::PS512);

    /// The ES256 signing algorithm
    pub const ES256: Algorithm = Self::EllipticCurve(jwa::ec::SigningAlgorithm::ES256);
    /// The ES384 signing algorithm
    pub const ES384: Algorithm = Self::EllipticCurve(jwa::ec::SigningAlgorithm::ES384);
    /// The ES512 signing algorithm
    pub const ES512: Algorithm = Self::EllipticCurve(jwa::ec::SigningAlgorithm::ES512);

    /// Every supported algorithm
    pub const ALL: [Algorithm; 12] = [
        Self::HS256,
        Self::HS384,
        Self::HS512,
        Self::RS256,
        Self::RS384,
        Self::RS512,
        Self::PS256,
        Self::PS384,
        Self::PS512,
        Self::ES256,
        Self::ES384,
        Self::ES512,
    ];

    /// The registered JOSE name of the algorithm, as it appears in `alg`
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Hmac(alg) => alg.name(),
            Self::Rsa(alg) => alg.name(),
            Self::EllipticCurve(alg) => alg.name(),
        }
    }

    /// The family of key material the algorithm requires
    #[must_use]
    pub fn family(self) -> jwa::Family {
        match self {
            Self::Hmac(_) => jwa::Family::Hmac,
            Self::Rsa(_) => jwa::Family::Rsa,
            Self::EllipticCurve(_) => jwa::Family::Ecdsa,
        }
    }

    /// The expected output size of the algorithm's signature in bytes
    ///
    /// RSA signatures are as long as the modulus; the size reported here is
    /// that of a 2048-bit key.
    #[must_use]
    pub fn signature_size(self) -> usize {
        match self {
            Self::Hmac(alg) => alg.signature_size(),
            Self::Rsa(alg) => alg.signature_size(),
            Self::EllipticCurve(alg) => alg.signature_size(),
        }
    }
}

impl FromStr for Algorithm {
    type Err = error::UnsupportedAlgorithm;

    /// Matches the exact, case-sensitive JOSE name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|alg| alg.name() == s)
            .ok_or_else(|| error::unknown_algorithm(s))
    }
}

impl TryFrom<&'_ str> for Algorithm {
    type Error = error::UnsupportedAlgorithm;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A JWS signer
pub trait Signer {
    /// The usable signature algorithms
    type Algorithm;

    /// The error returned on failure to sign
    type Error: fmt::Debug + fmt::Display + Sync + Send + 'static;

    /// Whether the specific algorithm provided is compatible
    /// with this signer
    fn can_sign(&self, alg: Self::Algorithm) -> bool;

    /// Attempts to sign the data provided using the specified algorithm
    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error>;
}

/// A JWS verifier
pub trait Verifier {
    /// The verifiable signature algorithms
    type Algorithm;

    /// The error returned on a failure to verify
    type Error: StdError + Send + Sync + 'static;

    /// Whether the specific algorithm provided is compatible
    /// with this verifier
    fn can_verify(&self, alg: Self::Algorithm) -> bool;

    /// Attempts to verify the data against the signature using the
    /// specified algorithm
    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error>;
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! ECC JSON Web Algorithm implementations
//!
//! P-256 and P-384 signatures are produced and checked by `ring`. `ring` has
//! no P-521 support, so ES512 is carried out with OpenSSL, using the same
//! fixed-width `r || s` signature encoding.

use std::fmt;

use openssl::{ec::EcGroupRef, nid::Nid};
use serde::{Deserialize, Serialize};

use crate::{error, jws};

mod private;
mod public;

pub use private::PrivateKey;
pub use public::PublicKey;

/// A named ECC curve
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Curve {
    /// The P-256 curve (prime256v1/secp256r1)
    P256,

    /// The P-384 curve (secp384r1)
    P384,

    /// The P-521 curve (secp521r1)
    P521,
}

impl Curve {
    fn nid(self) -> Nid {
        match self {
            Curve::P256 => Nid::X9_62_PRIME256V1,
            Curve::P384 => Nid::SECP384R1,
            Curve::P521 => Nid::SECP521R1,
        }
    }

    fn from_group(group: &EcGroupRef) -> Option<Self> {
        let nid = group.curve_name()?;
        [Curve::P256, Curve::P384, Curve::P521]
            .iter()
            .copied()
            .find(|crv| crv.nid() == nid)
    }

    /// The size in bytes of a field element, and so of each of `r` and `s`
    #[must_use]
    pub fn coordinate_size(self) -> usize {
        match self {
            Curve::P256 => 32,
            Curve::P384 => 48,
            Curve::P521 => 66,
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Curve::P256 => "P-256",
            Curve::P384 => "P-384",
            Curve::P521 => "P-521",
        };

        f.write_str(s)
    }
}

/// Elliptic curve cryptography key
#[derive(Debug, Clone)]
#[must_use]
pub struct EllipticCurve {
    key: MaybePrivate,
}

#[derive(Debug, Clone)]
enum MaybePrivate {
    PublicAndPrivate(PrivateKey),
    PublicOnly(PublicKey),
}

impl EllipticCurve {
    /// Constructs a key pair from a PEM file
    ///
    /// SEC1 (`EC PRIVATE KEY`) and PKCS#8 (`PRIVATE KEY`) encodings are
    /// accepted.
    ///
    /// # Errors
    ///
    /// The provided PEM file is not a valid ECC private key on a supported curve.
    pub fn private_key_from_pem(pem: &str) -> Result<Self, error::KeyRejected> {
        Ok(Self::from(PrivateKey::from_pem(pem)?))
    }

    /// Constructs a public key from a PEM file
    ///
    /// # Errors
    ///
    /// The provided PEM file is not a valid ECC public key on a supported curve.
    pub fn public_key_from_pem(pem: &str) -> Result<Self, error::KeyRejected> {
        Ok(Self::from(PublicKey::from_pem(pem)?))
    }

    /// The curve of this key
    #[must_use]
    pub fn curve(&self) -> Curve {
        self.public_key().curve()
    }

    pub(crate) fn private_key(&self) -> Option<&PrivateKey> {
        match &self.key {
            MaybePrivate::PublicAndPrivate(p) => Some(p),
            MaybePrivate::PublicOnly(_) => None,
        }
    }

    pub(crate) fn public_key(&self) -> &PublicKey {
        match &self.key {
            MaybePrivate::PublicAndPrivate(p) => p.public_key(),
            MaybePrivate::PublicOnly(p) => p,
        }
    }
}

/// Elliptic curve cryptography signing algorithms
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
pub enum SigningAlgorithm {
    /// Elliptic curve cryptography using the P-256 curve and SHA-256
    ES256,
    /// Elliptic curve cryptography using the P-384 curve and SHA-384
    ES384,
    /// Elliptic curve cryptography using the P-521 curve and SHA-512
    ES512,
}

impl From<SigningAlgorithm> for jws::Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        Self::EllipticCurve(alg)
    }
}

impl SigningAlgorithm {
    fn verification_algorithm(self) -> Option<&'static ring::signature::EcdsaVerificationAlgorithm> {
        match self {
            Self::ES256 => Some(&ring::signature::ECDSA_P256_SHA256_FIXED),
            Self::ES384 => Some(&ring::signature::ECDSA_P384_SHA384_FIXED),
            Self::ES512 => None,
        }
    }

    fn signing_algorithm(self) -> Option<&'static ring::signature::EcdsaSigningAlgorithm> {
        match self {
            Self::ES256 => Some(&ring::signature::ECDSA_P256_SHA256_FIXED_SIGNING),
            Self::ES384 => Some(&ring::signature::ECDSA_P384_SHA384_FIXED_SIGNING),
            Self::ES512 => None,
        }
    }

    /// Size in bytes of an ECDSA signature
    #[must_use]
    pub fn signature_size(self) -> usize {
        Curve::from(self).coordinate_size() * 2
    }

    /// The registered JOSE name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::ES512 => "ES512",
        }
    }
}

impl From<SigningAlgorithm> for Curve {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::ES256 => Self::P256,
            SigningAlgorithm::ES384 => Self::P384,
            SigningAlgorithm::ES512 => Self::P521,
        }
    }
}

impl From<Curve> for SigningAlgorithm {
    fn from(crv: Curve) -> Self {
        match crv {
            Curve::P256 => Self::ES256,
            Curve::P384 => Self::ES384,
            Curve::P521 => Self::ES512,
        }
    }
}

impl jws::Verifier for EllipticCurve {
    type Algorithm = SigningAlgorithm;
    type Error = error::SignatureMismatch;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        jws::Verifier::can_verify(self.public_key(), alg)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        jws::Verifier::verify(self.public_key(), alg, data, signature)
    }
}

impl jws::Signer for EllipticCurve {
    type Algorithm = SigningAlgorithm;
    type Error = error::SigningError;

    fn can_sign(&self, alg: Self::Algorithm) -> bool {
        if let Some(p) = self.private_key() {
            jws::Signer::can_sign(p, alg)
        } else {
            false
        }
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        if let Some(p) = self.private_key() {
            jws::Signer::sign(p, alg, data)
        } else {
            Err(error::incompatible_algorithm(alg).into())
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<PublicKey> for EllipticCurve {
    fn from(key: PublicKey) -> Self {
        Self {
            key: MaybePrivate::PublicOnly(key),
        }
    }
}

impl From<PrivateKey> for EllipticCurve {
    fn from(key: PrivateKey) -> Self {
        Self {
            key: MaybePrivate::PublicAndPrivate(key),
        }
    }
}

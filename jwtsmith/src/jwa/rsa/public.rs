use openssl::{
    pkey::HasPublic,
    rsa::{Rsa, RsaRef},
};

use super::{SigningAlgorithm, MAX_MODULUS_BITS, MIN_MODULUS_BITS};
use crate::{b64::Base64Url, error, jws};

/// RSA public key components
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PublicKey {
    /// The public modulus
    modulus: Base64Url,

    /// The public exponent
    exponent: Base64Url,
}

impl PublicKey {
    /// The public key's big-endian modulus
    pub fn modulus(&self) -> &[u8] {
        self.modulus.as_slice()
    }

    /// The public key's big-endian exponent
    pub fn exponent(&self) -> &[u8] {
        self.exponent.as_slice()
    }

    /// The size of the modulus in bits
    pub fn bits(&self) -> usize {
        self.modulus.as_slice().len() * 8
    }

    /// Imports an RSA public key from a PEM file
    ///
    /// # Errors
    ///
    /// The PEM is neither a SubjectPublicKeyInfo nor a PKCS#1 RSA public key.
    pub fn from_pem(pem: &str) -> Result<Self, error::KeyRejected> {
        let rsa = Rsa::public_key_from_pem(pem.as_bytes())
            .or_else(|_| Rsa::public_key_from_pem_pkcs1(pem.as_bytes()))
            .map_err(error::key_rejected)?;

        Self::from_openssl(&rsa)
    }

    pub(crate) fn from_openssl<T: HasPublic>(rsa: &RsaRef<T>) -> Result<Self, error::KeyRejected> {
        Self::from_components(rsa.n().to_vec(), rsa.e().to_vec())
    }

    /// Constructs a public key from the big-endian modulus and exponent
    ///
    /// # Errors
    ///
    /// The modulus is shorter than 2048 bits or longer than 8192 bits.
    pub fn from_components(
        modulus: impl Into<Vec<u8>>,
        exponent: impl Into<Vec<u8>>,
    ) -> Result<Self, error::KeyRejected> {
        let mut modulus = modulus.into();
        let exponent = exponent.into();

        let leading_zeros = modulus.iter().take_while(|&&b| b == 0).count();
        modulus.drain(..leading_zeros);

        let bits = modulus.len() * 8;
        if bits < MIN_MODULUS_BITS || bits > MAX_MODULUS_BITS {
            return Err(error::key_rejected(format!(
                "RSA modulus must be between {} and {} bits",
                MIN_MODULUS_BITS, MAX_MODULUS_BITS
            )));
        }

        if exponent.is_empty() {
            return Err(error::key_rejected("RSA exponent is missing"));
        }

        Ok(Self {
            modulus: Base64Url::from_raw(modulus),
            exponent: Base64Url::from_raw(exponent),
        })
    }
}

impl jws::Verifier for PublicKey {
    type Algorithm = SigningAlgorithm;
    type Error = error::SignatureMismatch;

    fn can_verify(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        let pk = ring::signature::RsaPublicKeyComponents {
            n: self.modulus.as_slice(),
            e: self.exponent.as_slice(),
        };

        pk.verify(alg.into_verification_params(), data, signature)
            .map_err(|_| error::signature_mismatch())
    }
}

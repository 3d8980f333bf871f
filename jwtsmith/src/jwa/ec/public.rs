use openssl::{
    bn::{BigNum, BigNumContext},
    ec::{EcGroup, EcKey, EcKeyRef, EcPoint, PointConversionForm},
    ecdsa::EcdsaSig,
    error::ErrorStack,
    pkey::HasPublic,
};

use super::{Curve, SigningAlgorithm};
use crate::{b64::Base64Url, error, jws};

/// ECC public key parameters
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PublicKey {
    curve: Curve,
    uncompressed_point: Base64Url,
}

impl PublicKey {
    /// Imports an ECC public key from a SubjectPublicKeyInfo PEM file
    ///
    /// # Errors
    ///
    /// The PEM is not an EC public key on P-256, P-384, or P-521.
    pub fn from_pem(pem: &str) -> Result<Self, error::KeyRejected> {
        let key = EcKey::public_key_from_pem(pem.as_bytes()).map_err(error::key_rejected)?;
        Self::from_openssl(&key)
    }

    pub(crate) fn from_openssl<T: HasPublic>(key: &EcKeyRef<T>) -> Result<Self, error::KeyRejected> {
        let group = key.group();
        let curve = Curve::from_group(group)
            .ok_or_else(|| error::key_rejected("unsupported elliptic curve"))?;

        let mut ctx = BigNumContext::new().map_err(error::key_rejected)?;
        let uncompressed_point = key
            .public_key()
            .to_bytes(group, PointConversionForm::UNCOMPRESSED, &mut ctx)
            .map_err(error::key_rejected)?;

        Ok(Self {
            curve,
            uncompressed_point: Base64Url::from_raw(uncompressed_point),
        })
    }

    /// The curve of this key
    #[must_use]
    pub fn curve(&self) -> Curve {
        self.curve
    }

    fn verify_with_openssl(&self, data: &[u8], signature: &[u8]) -> Result<bool, ErrorStack> {
        let width = self.curve.coordinate_size();
        if signature.len() != width * 2 {
            return Ok(false);
        }

        let group = EcGroup::from_curve_name(self.curve.nid())?;
        let mut ctx = BigNumContext::new()?;
        let point = EcPoint::from_bytes(&group, self.uncompressed_point.as_slice(), &mut ctx)?;
        let key = EcKey::from_public_key(&group, &point)?;

        let (r, s) = signature.split_at(width);
        let sig = EcdsaSig::from_private_components(BigNum::from_slice(r)?, BigNum::from_slice(s)?)?;

        sig.verify(&openssl::sha::sha512(data), &key)
    }
}

impl jws::Verifier for PublicKey {
    type Algorithm = SigningAlgorithm;
    type Error = error::SignatureMismatch;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        self.curve == Curve::from(alg)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        if !self.can_verify(alg) {
            return Err(error::signature_mismatch());
        }

        match alg.verification_algorithm() {
            Some(ring_alg) => {
                let pk = ring::signature::UnparsedPublicKey::new(
                    ring_alg,
                    self.uncompressed_point.as_slice(),
                );
                pk.verify(data, signature)
                    .map_err(|_| error::signature_mismatch())
            }
            None => match self.verify_with_openssl(data, signature) {
                Ok(true) => Ok(()),
                _ => Err(error::signature_mismatch()),
            },
        }
    }
}

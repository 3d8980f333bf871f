use std::{convert::TryFrom, fmt, sync::Arc};

use openssl::{
    ec::EcKey,
    ecdsa::EcdsaSig,
    pkey::{PKey, Private},
};
use ring::signature::EcdsaKeyPair;

use super::{Curve, PublicKey, SigningAlgorithm};
use crate::{error, jws};

/// ECC private key parameters
#[derive(Clone)]
#[must_use]
pub struct PrivateKey {
    public_key: PublicKey,
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Ring(Arc<EcdsaKeyPair>),
    OpenSsl(EcKey<Private>),
}

impl PrivateKey {
    /// Constructs an ECC key pair from a PEM file
    ///
    /// # Errors
    ///
    /// The provided PEM file is not a valid ECC private key.
    pub fn from_pem(pem: &str) -> Result<Self, error::KeyRejected> {
        let key = PKey::private_key_from_pem(pem.as_bytes()).map_err(error::key_rejected)?;
        Self::from_openssl_eckey(key.ec_key().map_err(error::key_rejected)?)
    }

    pub(crate) fn from_openssl_eckey(key: EcKey<Private>) -> Result<Self, error::KeyRejected> {
        let public_key = PublicKey::from_openssl(&key)?;

        let backend = match SigningAlgorithm::from(public_key.curve()).signing_algorithm() {
            Some(ring_alg) => {
                let pkcs8 = PKey::from_ec_key(key)
                    .and_then(|pkey| pkey.private_key_to_pkcs8())
                    .map_err(error::key_rejected)?;

                let pair =
                    EcdsaKeyPair::from_pkcs8(ring_alg, &pkcs8, &ring::rand::SystemRandom::new())
                        .map_err(|e| error::key_rejected(e.to_string()))?;

                Backend::Ring(Arc::new(pair))
            }
            None => {
                key.check_key().map_err(error::key_rejected)?;
                Backend::OpenSsl(key)
            }
        };

        Ok(Self {
            public_key,
            backend,
        })
    }

    /// Provides access to the public key parameters
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

impl jws::Signer for PrivateKey {
    type Algorithm = SigningAlgorithm;
    type Error = error::SigningError;

    fn can_sign(&self, alg: Self::Algorithm) -> bool {
        self.public_key.curve() == Curve::from(alg)
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        if !self.can_sign(alg) {
            return Err(error::incompatible_algorithm(alg).into());
        }

        match &self.backend {
            Backend::Ring(pair) => {
                let signature = pair
                    .sign(&ring::rand::SystemRandom::new(), data)
                    .map_err(|e| error::unexpected(e.to_string()))?;

                Ok(signature.as_ref().to_owned())
            }
            Backend::OpenSsl(key) => {
                let width = self.public_key.curve().coordinate_size();
                let width = i32::try_from(width).map_err(error::unexpected)?;

                let digest = openssl::sha::sha512(data);
                let sig = EcdsaSig::sign(&digest, key).map_err(error::unexpected)?;

                let mut signature = sig.r().to_vec_padded(width).map_err(error::unexpected)?;
                signature.extend(sig.s().to_vec_padded(width).map_err(error::unexpected)?);

                Ok(signature)
            }
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

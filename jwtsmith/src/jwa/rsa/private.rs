use std::{fmt, sync::Arc};

use openssl::{
    pkey::{PKey, Private},
    rsa::Rsa,
};
use ring::signature::RsaKeyPair;

use super::{PublicKey, SigningAlgorithm};
use crate::{error, jws};

/// RSA private key components
#[derive(Clone)]
#[must_use]
pub struct PrivateKey {
    public_key: PublicKey,
    ring_cache: Arc<RsaKeyPair>,
}

impl PrivateKey {
    /// Imports an RSA key pair from a PEM file
    ///
    /// # Errors
    ///
    /// The provided PEM file is not a valid RSA private key.
    pub fn from_pem(pem: &str) -> Result<Self, error::KeyRejected> {
        let pkey = PKey::private_key_from_pem(pem.as_bytes()).map_err(error::key_rejected)?;
        let rsa = pkey.rsa().map_err(error::key_rejected)?;
        Self::from_openssl(&rsa)
    }

    pub(crate) fn from_openssl(rsa: &Rsa<Private>) -> Result<Self, error::KeyRejected> {
        let public_key = PublicKey::from_openssl(rsa)?;

        let der = rsa.private_key_to_der().map_err(error::key_rejected)?;
        let ring_cache =
            Arc::new(RsaKeyPair::from_der(&der).map_err(|e| error::key_rejected(e.to_string()))?);

        Ok(Self {
            public_key,
            ring_cache,
        })
    }

    /// Provides access to the public key parameters
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
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

impl jws::Signer for PrivateKey {
    type Algorithm = SigningAlgorithm;
    type Error = error::Unexpected;

    fn can_sign(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn sign(&self, alg: Self::Algorithm, data: &[u8]) -> Result<Vec<u8>, Self::Error> {
        let mut buf = vec![0; self.ring_cache.public().modulus_len()];
        self.ring_cache
            .sign(
                alg.into_signing_params(),
                &ring::rand::SystemRandom::new(),
                data,
                &mut buf,
            )
            .map_err(|e| error::unexpected(e.to_string()))?;
        Ok(buf)
    }
}

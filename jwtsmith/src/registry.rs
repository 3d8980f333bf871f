//! The table of supported signing algorithms
//!
//! Lookups are by exact, case-sensitive JOSE name. Names outside the table
//! are rejected rather than mapped to some default.

use std::{collections::BTreeMap, fmt};

use once_cell::sync::Lazy;

use crate::{
    error,
    jwa::Family,
    jws::{self, Signer, Verifier},
    key::{SigningKey, VerifyingKey},
};

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// A signing and verification method for one algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor {
    alg: jws::Algorithm,
}

impl Descriptor {
    /// The algorithm this descriptor implements
    #[must_use]
    pub fn algorithm(&self) -> jws::Algorithm {
        self.alg
    }

    /// The registered JOSE name
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.alg.name()
    }

    /// The family of key material required
    #[must_use]
    pub fn family(&self) -> Family {
        self.alg.family()
    }

    /// Signs `message`
    ///
    /// # Errors
    ///
    /// The key is not compatible with this algorithm, or the backend failed.
    pub fn sign(&self, key: &SigningKey, message: &[u8]) -> Result<Vec<u8>, error::SigningError> {
        key.sign(self.alg, message)
    }

    /// Checks `signature` over `message`
    ///
    /// # Errors
    ///
    /// The key is not compatible with this algorithm, or the signature does
    /// not match.
    pub fn verify(
        &self,
        key: &VerifyingKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), error::VerifyError> {
        key.verify(self.alg, message, signature)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.alg, self.alg.family())
    }
}

/// An immutable table of algorithm descriptors, keyed by name
#[derive(Debug, Clone)]
pub struct Registry {
    methods: BTreeMap<&'static str, Descriptor>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry holding every supported algorithm
    #[must_use]
    pub fn new() -> Self {
        Self::with_algorithms(jws::Algorithm::ALL.iter().copied())
    }

    /// A registry restricted to the given algorithms
    #[must_use]
    pub fn with_algorithms(algs: impl IntoIterator<Item = jws::Algorithm>) -> Self {
        let methods = algs
            .into_iter()
            .map(|alg| (alg.name(), Descriptor { alg }))
            .collect();

        Self { methods }
    }

    /// The process-wide registry of every supported algorithm
    ///
    /// It is built on first use and never changes afterward.
    #[must_use]
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// The family of the named algorithm, if registered
    #[must_use]
    pub fn family_of(&self, alg: &str) -> Option<Family> {
        self.method_for(alg).map(Descriptor::family)
    }

    /// The descriptor for the named algorithm, if registered
    #[must_use]
    pub fn method_for(&self, alg: &str) -> Option<&Descriptor> {
        self.methods.get(alg)
    }

    /// The descriptor for the named algorithm
    ///
    /// # Errors
    ///
    /// The name is not registered.
    pub fn resolve(&self, alg: &str) -> Result<&Descriptor, error::UnsupportedAlgorithm> {
        self.method_for(alg).ok_or_else(|| {
            #[cfg(feature = "tracing")]
            tracing::debug!(jwt.alg = alg, "algorithm not registered");

            error::unknown_algorithm(alg)
        })
    }

    /// The descriptor for a known algorithm
    ///
    /// # Errors
    ///
    /// The algorithm was excluded from this registry.
    pub fn resolve_algorithm(
        &self,
        alg: jws::Algorithm,
    ) -> Result<&Descriptor, error::UnsupportedAlgorithm> {
        self.resolve(alg.name())
    }

    /// Iterates over the registered algorithms in name order
    pub fn algorithms(&self) -> impl Iterator<Item = jws::Algorithm> + '_ {
        self.methods.values().map(Descriptor::algorithm)
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;

    #[test]
    fn global_registry_knows_all_twelve() {
        let registry = Registry::global();
        assert_eq!(registry.algorithms().count(), 12);

        for alg in jws::Algorithm::ALL.iter().copied() {
            assert_eq!(registry.family_of(alg.name()), Some(alg.family()));
        }
    }

    #[test]
    fn partitions_by_prefix() {
        let registry = Registry::global();
        assert_eq!(registry.family_of("HS384"), Some(Family::Hmac));
        assert_eq!(registry.family_of("RS512"), Some(Family::Rsa));
        assert_eq!(registry.family_of("PS256"), Some(Family::Rsa));
        assert_eq!(registry.family_of("ES512"), Some(Family::Ecdsa));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let registry = Registry::global();
        for name in ["none", "hs256", "HS", "EdDSA", ""] {
            assert!(registry.method_for(name).is_none());
            assert!(registry.family_of(name).is_none());
            assert!(matches!(
                registry.resolve(name),
                Err(error::UnsupportedAlgorithm::Unknown(ref n)) if n == name
            ));
        }
    }

    #[test]
    fn restricted_registry_excludes_others() -> Result<()> {
        let registry = Registry::with_algorithms(vec![jws::Algorithm::ES256]);
        assert_eq!(registry.resolve("ES256")?.name(), "ES256");
        assert!(registry.resolve_algorithm(jws::Algorithm::HS256).is_err());
        Ok(())
    }

    #[test]
    fn descriptor_signs_and_verifies() -> Result<()> {
        let descriptor = Registry::global().resolve("HS512")?;
        let secret = crate::jwa::Hmac::new(&b"s3cret"[..]);

        let sig = descriptor.sign(&SigningKey::from(secret.clone()), b"msg")?;
        descriptor.verify(&VerifyingKey::from(secret), b"msg", &sig)?;
        assert_eq!(descriptor.to_string(), "HS512 (HMAC)");
        Ok(())
    }
}

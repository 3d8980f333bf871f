//! Implementations of the JSON Web Algorithms (JWA) standard
//!
//! The specifications for these algorithms can be found in [RFC7518][].
//!
//! [RFC7518]: https://tools.ietf.org/html/rfc7518

use std::fmt;

pub mod ec;
pub mod hmac;
pub mod rsa;

#[doc(inline)]
pub use ec::EllipticCurve;
#[doc(inline)]
pub use hmac::Hmac;
#[doc(inline)]
pub use rsa::Rsa;

/// The family of key material an algorithm signs with
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub enum Family {
    /// A shared secret
    Hmac,

    /// An RSA key pair
    Rsa,

    /// An elliptic curve key pair
    Ecdsa,
}

impl Family {
    /// Whether the family signs with a shared secret rather than a key pair
    #[must_use]
    pub fn is_symmetric(self) -> bool {
        self == Self::Hmac
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Hmac => "HMAC",
            Self::Rsa => "RSA",
            Self::Ecdsa => "ECDSA",
        };

        f.write_str(s)
    }
}

//! This crate decodes, verifies, creates, and inspects compact JSON Web
//! Tokens, as described by:
//!
//! * JSON Web Signature (JWS): [RFC7515][]
//! * JSON Web Algorithms (JWA): [RFC7518][]
//! * JSON Web Token (JWT): [RFC7519][]
//!
//! Tokens may be signed with HMAC (`HS256`, `HS384`, `HS512`), RSA
//! (`RS256`, `RS384`, `RS512`, `PS256`, `PS384`, `PS512`), or ECDSA (`ES256`,
//! `ES384`, `ES512`). The `none` algorithm and encrypted tokens (JWE) are not
//! supported.
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC7519]: https://tools.ietf.org/html/rfc7519
//!
//! # Example
//!
//! ```
//! use jwtsmith::{jwt::CoreClaims, Create, Credentials, Verifier};
//!
//! let credentials = Credentials::from_secret("s3cret");
//!
//! let created = Create::new()
//!     .credentials(credentials.clone())
//!     .subject("u1")
//!     .expires_in("1h")
//!     .sign()
//!     .expect("token could not be created");
//!
//! let verification = Verifier::new()
//!     .verify(created.token().as_str(), &credentials)
//!     .expect("token could not be processed");
//!
//! assert!(verification.is_valid());
//! assert_eq!(verification.claims().sub().unwrap().as_str(), "u1");
//! ```
//!
//! Failures that stop an operation are reported as a [`JwtError`], whose
//! [`kind()`][JwtError::kind] maps to a process exit code. A token that is
//! processed but fails verification is not an error; its
//! [`Outcome`][verify::Outcome] says why.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_copy_implementations,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

pub mod b64;
pub mod claim_value;
pub mod create;
pub mod error;
pub mod expiration;
pub mod jwa;
pub mod jws;
pub mod jwt;
pub mod key;
pub mod registry;
pub mod verify;

#[cfg(test)]
pub(crate) mod test;

#[doc(inline)]
pub use create::{Create, Created};
#[doc(inline)]
pub use error::{ErrorKind, JwtError};
#[doc(inline)]
pub use expiration::{check_expiration, ExpirationStatus};
#[doc(inline)]
pub use jwt::{decode, Jwt, JwtRef};
#[doc(inline)]
pub use key::Credentials;
#[doc(inline)]
pub use registry::Registry;
#[doc(inline)]
pub use verify::{verify, Verification, Verifier};

pub use jwtsmith_clock::{parse_duration, Clock, System, TestClock, UnixTime};

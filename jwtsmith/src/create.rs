//! Building and signing new tokens
//!
//! [`Create`] gathers everything that goes into a token and signs it in one
//! step. Every input is optional except the credentials; empty strings are
//! treated as unset.
//!
//! ```
//! use jwtsmith::{create::Create, verify::Verifier, Credentials, TestClock, UnixTime};
//!
//! let clock = TestClock::new(UnixTime(1_700_000_000));
//! let credentials = Credentials::from_secret("s3cret");
//!
//! let created = Create::new()
//!     .credentials(credentials.clone())
//!     .subject("u1")
//!     .claim_pair("admin=true")
//!     .expires_in("1h")
//!     .sign_with(jwtsmith::Registry::global(), &clock)
//!     .unwrap();
//!
//! assert_eq!(created.header().alg(), Some("HS256"));
//! assert_eq!(created.claims().get("admin"), Some(&serde_json::json!(true)));
//!
//! let verification = Verifier::new()
//!     .with_clock(clock)
//!     .verify(created.token().as_str(), &credentials)
//!     .unwrap();
//! assert!(verification.is_valid());
//! ```

use std::path::PathBuf;

use jwtsmith_clock::{parse_duration, Clock, System, UnixTime};
use serde_json::{Map, Value};

use crate::{
    claim_value,
    error::{self, InvalidFormat, JwtError, KeyLoad},
    jwt::{self, Claims, Header, Jwt},
    key::Credentials,
    registry::Registry,
};

#[derive(Clone, Debug)]
enum FreeClaim {
    Typed(String, Value),
    Raw(String),
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// A builder for a new signed token
///
/// The payload is assembled as follows:
///
/// 1. If a complete JSON payload was given with
///    [`claims_json()`][Self::claims_json], it is used verbatim and every
///    other claim input is ignored. No `iat` is added.
/// 2. Otherwise, free-form claims are added in the order given, then the
///    `iss`, `sub`, `aud` and `jti` inputs overwrite any free-form claims of
///    the same name.
/// 3. `iat` is set to the given timestamp, or to the current time.
/// 4. `nbf` and `exp` are set to the current time plus their lifetimes.
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct Create {
    algorithm: Option<String>,
    credentials: Credentials,
    free: Vec<FreeClaim>,
    claims_json: Option<String>,
    issuer: Option<String>,
    subject: Option<String>,
    audience: Option<String>,
    jwt_id: Option<String>,
    expires_in: Option<String>,
    not_before: Option<String>,
    issued_at: Option<String>,
    kid: Option<String>,
}

impl Create {
    /// An empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Signs with the named algorithm
    ///
    /// If unset, the algorithm is HS256 for a secret and RS256 for a key
    /// file.
    pub fn algorithm(mut self, alg: impl Into<String>) -> Self {
        self.algorithm = non_empty(alg.into());
        self
    }

    /// Signs with the given credentials
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Signs with a shared secret
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.credentials = self.credentials.with_secret(secret);
        self
    }

    /// Signs with the private key in a PEM file
    pub fn key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials = self.credentials.with_key_file(path);
        self
    }

    /// Adds a claim with a typed value
    pub fn claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.free.push(FreeClaim::Typed(name.into(), value.into()));
        self
    }

    /// Adds a claim written as `key=value`
    ///
    /// The value's JSON type is inferred when signing; see
    /// [`parse_claim_value()`][crate::claim_value::parse_claim_value].
    pub fn claim_pair(mut self, pair: impl Into<String>) -> Self {
        self.free.push(FreeClaim::Raw(pair.into()));
        self
    }

    /// Uses a complete JSON object as the payload
    pub fn claims_json(mut self, json: impl Into<String>) -> Self {
        self.claims_json = non_empty(json.into());
        self
    }

    /// Sets the `iss` claim
    pub fn issuer(mut self, iss: impl Into<String>) -> Self {
        self.issuer = non_empty(iss.into());
        self
    }

    /// Sets the `sub` claim
    pub fn subject(mut self, sub: impl Into<String>) -> Self {
        self.subject = non_empty(sub.into());
        self
    }

    /// Sets the `aud` claim
    pub fn audience(mut self, aud: impl Into<String>) -> Self {
        self.audience = non_empty(aud.into());
        self
    }

    /// Sets the `jti` claim
    pub fn jwt_id(mut self, jti: impl Into<String>) -> Self {
        self.jwt_id = non_empty(jti.into());
        self
    }

    /// Sets `exp` to a lifetime from now, such as `"1h"` or `"7d"`
    pub fn expires_in(mut self, lifetime: impl Into<String>) -> Self {
        self.expires_in = non_empty(lifetime.into());
        self
    }

    /// Sets `nbf` to a delay from now, such as `"5m"`
    pub fn not_before(mut self, delay: impl Into<String>) -> Self {
        self.not_before = non_empty(delay.into());
        self
    }

    /// Sets `iat` to a Unix timestamp or an RFC 3339 date-time
    pub fn issued_at(mut self, iat: impl Into<String>) -> Self {
        self.issued_at = non_empty(iat.into());
        self
    }

    /// Sets the `kid` header
    pub fn kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = non_empty(kid.into());
        self
    }

    /// Builds and signs the token against the global registry and the
    /// system clock
    ///
    /// # Errors
    ///
    /// See [`sign_with()`][Self::sign_with].
    pub fn sign(&self) -> Result<Created, JwtError> {
        self.sign_with(Registry::global(), &System)
    }

    /// Builds and signs the token
    ///
    /// # Errors
    ///
    /// * The algorithm is not registered.
    /// * A lifetime, timestamp, claim pair or JSON payload is malformed.
    /// * The credentials are missing, do not fit the algorithm, or cannot
    ///   be loaded.
    pub fn sign_with<C: Clock>(&self, registry: &Registry, clock: &C) -> Result<Created, JwtError> {
        let (method, material) = match &self.algorithm {
            Some(alg) => (registry.resolve(alg)?, None),
            None => {
                let material = self.credentials.material()?;
                let method = registry.resolve_algorithm(material.default_algorithm())?;
                (method, Some(material))
            }
        };

        let claims = self.build_claims(clock.now())?;

        let mut header = Header::new(method.algorithm());
        if let Some(kid) = &self.kid {
            header = header.with_kid(kid.as_str());
        }

        let material = match material {
            Some(material) => material,
            None => self.credentials.material()?,
        };
        let key = material.signing_key(method.algorithm())?;
        let token = Jwt::try_from_parts_with_signature(&header, &claims, method, &key)
            .map_err(KeyLoad::Signing)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(jwt.alg = %method, "token created");

        let (header, claims) = jwt::decode(token.as_str())?.into_parts();
        Ok(Created {
            token,
            header,
            claims,
        })
    }

    fn build_claims(&self, now: UnixTime) -> Result<Claims, InvalidFormat> {
        if let Some(json) = &self.claims_json {
            let payload: Map<String, Value> =
                serde_json::from_str(json).map_err(InvalidFormat::ClaimsJson)?;
            return Ok(payload.into());
        }

        let mut claims = Claims::new();
        for free in &self.free {
            match free {
                FreeClaim::Typed(name, value) => {
                    claims.insert(name.as_str(), value.clone());
                }
                FreeClaim::Raw(pair) => {
                    let (name, value) = claim_value::parse_claim_pair(pair)?;
                    claims.insert(name, value);
                }
            }
        }

        let registered = [
            ("iss", &self.issuer),
            ("sub", &self.subject),
            ("aud", &self.audience),
            ("jti", &self.jwt_id),
        ];
        for (name, value) in registered.iter() {
            if let Some(value) = value {
                claims.insert(*name, value.as_str());
            }
        }

        let iat = match &self.issued_at {
            Some(iat) => UnixTime::parse(iat)?,
            None => now,
        };
        claims.insert("iat", iat.0);

        if let Some(delay) = &self.not_before {
            claims.insert("nbf", offset("nbf", delay, now)?.0);
        }

        if let Some(lifetime) = &self.expires_in {
            claims.insert("exp", offset("exp", lifetime, now)?.0);
        }

        Ok(claims)
    }
}

/// `now` plus a strictly positive lifetime, in whole seconds
fn offset(claim: &'static str, lifetime: &str, now: UnixTime) -> Result<UnixTime, InvalidFormat> {
    let lifetime = parse_duration(lifetime).map_err(|e| error::invalid_duration(claim, e))?;

    if lifetime.as_nanos() == 0 {
        return Err(InvalidFormat::NonPositiveDuration { claim });
    }

    now.checked_add(lifetime)
        .ok_or(InvalidFormat::TimeOverflow { claim })
}

/// A freshly signed token, with its header and claims as decoded from it
#[derive(Clone, Debug)]
#[must_use]
pub struct Created {
    token: Jwt,
    header: Header,
    claims: Claims,
}

impl Created {
    /// The signed token
    pub fn token(&self) -> &Jwt {
        &self.token
    }

    /// The token's header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The token's claims
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Extracts the token, header and claims
    pub fn into_parts(self) -> (Jwt, Header, Claims) {
        (self.token, self.header, self.claims)
    }
}

//! Byte buffers that are represented as unpadded, URL-safe base64

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use thiserror::Error;

/// The data provided was not valid URL-safe base64 without padding
#[derive(Debug, Error)]
#[error("invalid base64url data")]
pub struct InvalidBase64Data {
    #[from]
    source: base64::DecodeError,
}

/// Owned data to be encoded as URL-safe base64 with no padding
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Base64Url(Vec<u8>);

impl Base64Url {
    /// Wraps raw bytes
    #[inline]
    pub fn from_raw(raw: impl Into<Vec<u8>>) -> Self {
        Self(raw.into())
    }

    /// Decodes an unpadded, URL-safe base64 string
    ///
    /// # Errors
    ///
    /// The input contains characters outside the URL-safe alphabet,
    /// carries padding, or has an impossible length.
    pub fn from_encoded(enc: impl AsRef<[u8]>) -> Result<Self, InvalidBase64Data> {
        Ok(Self(URL_SAFE_NO_PAD.decode(enc)?))
    }

    /// The raw bytes
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Unwraps the raw bytes
    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// The length of the encoded form
    #[inline]
    pub fn encoded_len(&self) -> usize {
        calc_encoded_len(self.0.len())
    }
}

/// The length of the unpadded encoding of `len` bytes
#[inline]
pub const fn calc_encoded_len(len: usize) -> usize {
    (len * 4 + 2) / 3
}

/// Appends the unpadded, URL-safe encoding of `data` to `buf`
pub(crate) fn encode_into(data: impl AsRef<[u8]>, buf: &mut String) {
    URL_SAFE_NO_PAD.encode_string(data, buf);
}

impl From<Vec<u8>> for Base64Url {
    #[inline]
    fn from(raw: Vec<u8>) -> Self {
        Self(raw)
    }
}

impl From<&[u8]> for Base64Url {
    #[inline]
    fn from(raw: &[u8]) -> Self {
        Self(raw.to_vec())
    }
}

impl AsRef<[u8]> for Base64Url {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(&self.0))
    }
}

impl fmt::Debug for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "`{}`", self)
    }
}

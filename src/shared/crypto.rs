//! Token Crypto Primitives
//!
//! URL-safe base64 without padding, HMAC-SHA256 signing with a process-wide
//! key, and constant-time comparison of signature bytes.

use std::fmt;
use std::sync::Arc;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// URL-safe alphabet, padding stripped on encode and optional on decode.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode bytes as base64url with trailing `=` removed.
pub fn encode_b64(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_LENIENT.encode(data)
}

/// Decode base64url, accepting input with or without padding.
pub fn decode_b64(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_LENIENT.decode(data)
}

/// Server secret used to sign every token.
///
/// The HMAC state is keyed once at construction and shared through an `Arc`;
/// each signature starts from a copy of it.
#[derive(Clone)]
pub struct SigningKey {
    mac: Arc<HmacSha256>,
    key_length: usize,
}

impl SigningKey {
    /// Key HMAC-SHA256 with `secret`.
    ///
    /// # Errors
    /// Returns error if the secret is empty.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SigningKeyError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(SigningKeyError::Empty);
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|_| SigningKeyError::InvalidLength(secret.len()))?;

        Ok(Self {
            mac: Arc::new(mac),
            key_length: secret.len(),
        })
    }

    /// HMAC-SHA256 of `data` under this key.
    pub fn sign(&self, data: &[u8]) -> [u8; 32] {
        let mut mac = HmacSha256::clone(&self.mac);
        mac.update(data);
        mac.finalize().into_bytes().into()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_length", &self.key_length)
            .finish_non_exhaustive()
    }
}

/// Errors that can occur when creating a signing key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningKeyError {
    #[error("Signing key must not be empty")]
    Empty,

    #[error("Signing key of {0} bytes rejected by HMAC-SHA256")]
    InvalidLength(usize),
}

/// Byte equality whose timing does not depend on where the inputs differ.
///
/// Slices of different length compare unequal; length is not secret.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

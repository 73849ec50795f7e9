//! Token Codec
//!
//! Stateless, versioned, HMAC-signed bearer tokens.
//!
//! ```text
//! Version: v1
//! +---------+------------------+--------------------------------------+
//! | Version |  ID (base64url)  |  HMAC-SHA256 (base64url, no padding) |
//! +---------+------------------+--------------------------------------+
//! |   v1    |       NDI        | gjUD53H-hEF855341KCK3N8_Oy5wyQHGXKBb |
//! +---------+------------------+--------------------------------------+
//! ```
//!
//! The HMAC message is derived from the account's email and password hash,
//! so a token stays valid exactly as long as those two values (and the
//! server key) are unchanged. Nothing is stored server side.

use std::fmt;
use std::str::FromStr;

use crate::domain::{User, UserLookup};
use crate::shared::crypto::{
    constant_time_eq, decode_b64, encode_b64, SigningKey, SigningKeyError,
};
use crate::shared::error::AppError;

/// Token format versions understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenVersion {
    V1,
}

impl TokenVersion {
    /// Version used for every newly issued token.
    pub const CURRENT: Self = Self::V1;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
        }
    }
}

impl fmt::Display for TokenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenVersion {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(Self::V1),
            other => Err(TokenError::UnsupportedVersion(other.to_string())),
        }
    }
}

/// Token codec errors.
///
/// Every verification failure is `Malformed`, whatever the cause, so a
/// caller cannot tell a forged signature from an unknown account.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Invalid token.")]
    Malformed,

    #[error("Unsupported token version: {0}")]
    UnsupportedVersion(String),

    #[error("User lookup failed: {0}")]
    Lookup(#[source] AppError),
}

/// A token split into its parts and decoded, not yet checked against a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaim {
    pub version: TokenVersion,
    pub user_id: String,
    pub signature: Vec<u8>,
}

/// Outcome of a successful verification.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    /// Account resolved from the token's id part
    pub user: User,
    /// Token exactly as presented
    pub token: String,
}

/// Issues and verifies tokens under a single server key.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    key: SigningKey,
}

impl TokenCodec {
    /// Create a codec keyed with the server secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SigningKeyError> {
        Ok(Self {
            key: SigningKey::new(secret)?,
        })
    }

    /// Generate a token with the current version.
    pub fn generate(&self, user_id: &str, email: &str, password_hash: &str) -> String {
        self.encode(TokenVersion::CURRENT, user_id, email, password_hash)
    }

    /// Generate a token for an explicitly named version.
    pub fn generate_with_version(
        &self,
        version: &str,
        user_id: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<String, TokenError> {
        let version = version.parse::<TokenVersion>()?;
        Ok(self.encode(version, user_id, email, password_hash))
    }

    /// Token for a stored account, from its current credentials.
    pub fn token_for(&self, user: &User) -> String {
        self.generate(&user.token_subject(), &user.email, &user.password_hash)
    }

    fn encode(&self, version: TokenVersion, user_id: &str, email: &str, password_hash: &str) -> String {
        match version {
            TokenVersion::V1 => {
                let id_part = encode_b64(user_id);
                let signature = encode_b64(self.sign_v1(email, password_hash));
                format!("{}.{}.{}", version, id_part, signature)
            }
        }
    }

    fn sign_v1(&self, email: &str, password_hash: &str) -> [u8; 32] {
        let message = encode_b64(format!("{}.{}", email, password_hash));
        self.key.sign(message.as_bytes())
    }

    /// Split and decode a token without consulting any user store.
    pub fn decode(&self, token: &str) -> Result<TokenClaim, TokenError> {
        let mut segments = token.split('.');
        let version = segments.next().unwrap_or_default();
        let rest: Vec<&str> = segments.collect();

        if rest.is_empty() {
            return Err(TokenError::Malformed);
        }

        let version = version
            .parse::<TokenVersion>()
            .map_err(|_| TokenError::Malformed)?;

        match version {
            TokenVersion::V1 => {
                let [id_part, signature_part] = rest.as_slice() else {
                    return Err(TokenError::Malformed);
                };

                let user_id = decode_b64(id_part)
                    .ok()
                    .and_then(|bytes| String::from_utf8(bytes).ok())
                    .ok_or(TokenError::Malformed)?;
                let signature = decode_b64(signature_part).map_err(|_| TokenError::Malformed)?;

                Ok(TokenClaim {
                    version,
                    user_id,
                    signature,
                })
            }
        }
    }

    /// Check a decoded claim against the account's current credentials.
    pub fn check_signature(
        &self,
        claim: &TokenClaim,
        email: &str,
        password_hash: &str,
    ) -> Result<(), TokenError> {
        let expected = match claim.version {
            TokenVersion::V1 => self.sign_v1(email, password_hash),
        };

        if constant_time_eq(&expected, &claim.signature) {
            Ok(())
        } else {
            Err(TokenError::Malformed)
        }
    }

    /// Fully verify a token: decode it, resolve its user, check the signature.
    pub async fn verify<L>(&self, token: &str, users: &L) -> Result<VerifiedToken, TokenError>
    where
        L: UserLookup + ?Sized,
    {
        let claim = self.decode(token)?;

        let user = users
            .find_for_token(&claim.user_id)
            .await
            .map_err(TokenError::Lookup)?
            .ok_or(TokenError::Malformed)?;

        self.check_signature(&claim, &user.email, &user.password_hash)?;

        Ok(VerifiedToken {
            user,
            token: token.to_string(),
        })
    }
}

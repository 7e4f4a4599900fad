//! Signed bearer tokens for the API gateway.
//!
//! Tokens are HS256 JWTs signed with the stack's `JWT_SECRET`. The key is
//! the secret string's raw bytes, which is how the consuming services
//! verify them.

use std::fmt;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants::{MIN_SIGNING_KEY_LEN, TOKEN_ISSUER, TOKEN_LIFETIME_SECS};
use crate::error::{Result, SigningError};

/// Role claim understood by the database's row-level security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Anon,
    ServiceRole,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Anon => "anon",
            Role::ServiceRole => "service_role",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub role: Role,
    pub iss: String,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
}

impl Claims {
    /// Claims for `role`, issued at `issued_at`, valid for ten years.
    pub fn new(role: Role, issued_at: i64) -> Self {
        Self {
            role,
            iss: TOKEN_ISSUER.to_string(),
            iat: issued_at,
            exp: issued_at + TOKEN_LIFETIME_SECS,
        }
    }
}

fn check_key(signing_key: &str) -> Result<()> {
    if signing_key.is_empty() {
        return Err(SigningError::EmptyKey.into());
    }
    if signing_key.len() < MIN_SIGNING_KEY_LEN {
        return Err(SigningError::KeyTooShort {
            len: signing_key.len(),
            min: MIN_SIGNING_KEY_LEN,
        }
        .into());
    }
    Ok(())
}

/// Issue a token for `role`, issued now.
///
/// # Errors
///
/// Returns `SigningError` if the key is empty, too short, or signing fails.
pub fn issue_token(role: Role, signing_key: &str) -> Result<String> {
    issue_token_at(role, signing_key, Utc::now().timestamp())
}

/// Issue a token for `role` with an explicit issued-at timestamp.
pub fn issue_token_at(role: Role, signing_key: &str, issued_at: i64) -> Result<String> {
    check_key(signing_key)?;

    let claims = Claims::new(role, issued_at);
    debug!(role = %role, iat = claims.iat, exp = claims.exp, "signing token");

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key.as_bytes()),
    )
    .map_err(|e| SigningError::Encode(e).into())
}

/// Verify a token's signature and issuer and return its claims.
///
/// # Errors
///
/// Returns `SigningError::Decode` if verification fails or the token has
/// expired.
pub fn decode_token(token: &str, signing_key: &str) -> Result<Claims> {
    check_key(signing_key)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss"]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(signing_key.as_bytes()),
        &validation,
    )
    .map_err(SigningError::Decode)?;

    Ok(data.claims)
}

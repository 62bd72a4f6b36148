//! HS256 access-token validation.
//!
//! Tokens carry a [`Claims`] payload. Only the signature, `exp` and the role
//! are looked at here.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// JWT claims expected in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the acting user's id as issued by the identity service.
    pub sub: String,
    /// Role name (e.g. `"admin"`, `"editor"`).
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Configuration for token validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret shared with the token issuer.
    pub secret: String,
}

impl JwtConfig {
    /// Load from `JWT_SECRET` (required, non-empty).
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        if secret.trim().is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        Ok(Self { secret })
    }
}

/// Validate and decode an access token, returning the embedded [`Claims`].
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

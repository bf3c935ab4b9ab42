//! HS256 access tokens.
//!
//! Tokens are minted by the identity service that owns user accounts; herald
//! shares its signing secret and reads `sub` (the username) and `role`. The
//! same token authenticates HTTP requests and the push channel.
//! [`issue_token`] exists for tooling and tests.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use herald_core::roles::ROLE_USER;
use serde::{Deserialize, Serialize};

use crate::config::env_or;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Username.
    pub sub: String,
    /// Absent on tokens for ordinary users.
    #[serde(default = "default_role")]
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

fn default_role() -> String {
    ROLE_USER.to_string()
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Lifetime of tokens minted by [`issue_token`].
    pub token_ttl_mins: i64,
}

impl JwtConfig {
    /// | Env Var                  | Default  |
    /// |--------------------------|----------|
    /// | `JWT_SECRET`             | required |
    /// | `JWT_ACCESS_EXPIRY_MINS` | `60`     |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is unset or empty.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        assert!(!secret.is_empty(), "JWT_SECRET must be set and non-empty");
        Self {
            secret,
            token_ttl_mins: env_or("JWT_ACCESS_EXPIRY_MINS", 60),
        }
    }
}

pub fn issue_token(
    username: &str,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: username.to_string(),
        role: role.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(config.token_ttl_mins)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Check signature and expiry, returning the claims.
pub fn validate_token(token: &str, config: &JwtConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

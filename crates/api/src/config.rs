//! Server configuration.

use std::fmt::Display;
use std::str::FromStr;

use herald_core::checkpoint::CheckpointPolicy;

use crate::auth::jwt::JwtConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Parsed from the comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// How often the digest scheduler looks for due users.
    pub digest_check_interval_secs: u64,
    /// Where a user's first digest window starts.
    pub checkpoint_policy: CheckpointPolicy,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `DATABASE_URL`               | required                |
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `3000`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `DIGEST_CHECK_INTERVAL_SECS` | `60`                    |
    /// | `SUMMARY_CHECKPOINT_POLICY`  | `widen_to_last_login`   |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics when `DATABASE_URL` is missing or a value does not parse.
    pub fn from_env() -> Self {
        let cors_origins = env_or("CORS_ORIGINS", "http://localhost:5173".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            digest_check_interval_secs: env_or("DIGEST_CHECK_INTERVAL_SECS", 60),
            checkpoint_policy: env_or("SUMMARY_CHECKPOINT_POLICY", CheckpointPolicy::default()),
            jwt: JwtConfig::from_env(),
        }
    }
}

/// Parse `key` from the environment, or use `default` when it is unset.
///
/// # Panics
///
/// Panics with the variable name when the value is set but malformed.
pub(crate) fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}

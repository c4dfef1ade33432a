//! Access token generation and validation

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::Role;
use crate::config::JwtConfig;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued at (unix seconds)
    pub iat: u64,
    /// Expiration (unix seconds)
    pub exp: u64,
}

/// Issue a short-lived HS256 access token
pub fn generate_token(
    config: &JwtConfig,
    user_id: &str,
    email: &str,
    role: Role,
) -> anyhow::Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let ttl = u64::try_from(config.access_ttl_minutes)?.saturating_mul(60);

    let claims = Claims {
        sub: user_id.to_owned(),
        email: email.to_owned(),
        role,
        iat: now,
        exp: now + ttl,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate and decode an access token
pub fn validate_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

/// Seconds an access token stays valid, as reported to clients
pub fn expires_in(config: &JwtConfig) -> i64 {
    config.access_ttl_minutes * 60
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test_secret_key_minimum_32_characters_long".to_owned(),
            access_ttl_minutes: 15,
            refresh_ttl_days: 7,
        }
    }

    #[test]
    fn test_token_round_trip_keeps_role() {
        let token = generate_token(&config(), "user-1", "scout@example.com", Role::Admin).unwrap();
        let claims = validate_token(&token, &config().secret).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = generate_token(&config(), "user-1", "scout@example.com", Role::Scout).unwrap();

        assert!(validate_token(&token, "another_secret_that_is_32_chars_long!!").is_err());
    }
}

//! Token issuing and verification
//!
//! Access and refresh tokens are HS256 JWTs signed with distinct secrets, so
//! one kind can never pass for the other.

use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::{PublicUser, TokenPair};

/// Token configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    /// Access token lifetime in seconds (default: 1 hour)
    pub access_token_expiry: u64,
    /// Refresh token lifetime in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

impl TokenConfig {
    /// Create a new TokenConfig from environment variables
    ///
    /// # Environment Variables
    /// - `ACCESS_TOKEN_SECRET`: Secret signing access tokens (required)
    /// - `REFRESH_TOKEN_SECRET`: Secret signing refresh tokens (required, distinct)
    /// - `ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 3600)
    /// - `REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let access_secret = std::env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("ACCESS_TOKEN_SECRET environment variable not set"))?;
        let refresh_secret = std::env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("REFRESH_TOKEN_SECRET environment variable not set"))?;

        if access_secret.is_empty() || refresh_secret.is_empty() {
            return Err(anyhow::anyhow!("Token secrets must not be empty"));
        }
        if access_secret == refresh_secret {
            return Err(anyhow::anyhow!(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ"
            ));
        }

        let access_token_expiry = std::env::var("ACCESS_TOKEN_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600);

        let refresh_token_expiry = std::env::var("REFRESH_TOKEN_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(604_800);

        Ok(TokenConfig {
            access_secret,
            refresh_secret,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    /// Unique per issued token
    pub jti: Uuid,
    pub iat: u64,
    pub exp: u64,
    pub token_type: TokenType,
}

/// Refresh token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub iat: u64,
    pub exp: u64,
    pub token_type: TokenType,
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("{0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Expected a {0:?} token")]
    WrongType(TokenType),
}

/// Seconds since the epoch
pub(crate) fn now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// Token issuer
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
    config: TokenConfig,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        TokenService {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            validation,
            config,
        }
    }

    pub fn generate_access_token(&self, user: &PublicUser) -> Result<String, TokenError> {
        let now = now();
        let claims = AccessClaims {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + self.config.access_token_expiry,
            token_type: TokenType::Access,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.access_encoding)?)
    }

    pub fn generate_refresh_token(&self, user_id: Uuid) -> Result<String, TokenError> {
        let now = now();
        let claims = RefreshClaims {
            sub: user_id,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + self.config.refresh_token_expiry,
            token_type: TokenType::Refresh,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.refresh_encoding)?)
    }

    pub fn generate_pair(&self, user: &PublicUser) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.generate_access_token(user)?,
            refresh_token: self.generate_refresh_token(user.id)?,
        })
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims = decode::<AccessClaims>(token, &self.access_decoding, &self.validation)?.claims;
        if claims.token_type != TokenType::Access {
            return Err(TokenError::WrongType(TokenType::Access));
        }
        Ok(claims)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims =
            decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation)?.claims;
        if claims.token_type != TokenType::Refresh {
            return Err(TokenError::WrongType(TokenType::Refresh));
        }
        Ok(claims)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> TokenConfig {
    TokenConfig {
        access_secret: "test-access-secret".to_string(),
        refresh_secret: "test-refresh-secret".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604_800,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn user() -> PublicUser {
        PublicUser {
            id: Uuid::new_v4(),
            username: "jane".into(),
            email: "jane@example.com".into(),
            full_name: "Jane Doe".into(),
            avatar: "https://cdn.example.test/a.png".into(),
            cover_image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_carries_identity() {
        let service = TokenService::new(test_config());
        let user = user();

        let token = service.generate_access_token(&user).unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "jane");
        assert_eq!(claims.full_name, "Jane Doe");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let service = TokenService::new(test_config());
        let pair = service.generate_pair(&user()).unwrap();

        assert!(service.validate_access_token(&pair.refresh_token).is_err());
        assert!(service.validate_refresh_token(&pair.access_token).is_err());
        assert!(service.validate_refresh_token(&pair.refresh_token).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = TokenService::new(test_config());
        let claims = RefreshClaims {
            sub: Uuid::new_v4(),
            jti: Uuid::new_v4(),
            iat: now() - 7200,
            exp: now() - 3600,
            token_type: TokenType::Refresh,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-refresh-secret"),
        )
        .unwrap();

        assert!(service.validate_refresh_token(&token).is_err());
    }

    #[test]
    fn token_type_is_checked_even_with_the_right_key() {
        let service = TokenService::new(test_config());
        let claims = RefreshClaims {
            sub: Uuid::new_v4(),
            jti: Uuid::new_v4(),
            iat: now(),
            exp: now() + 60,
            token_type: TokenType::Access,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-refresh-secret"),
        )
        .unwrap();

        assert!(matches!(
            service.validate_refresh_token(&token),
            Err(TokenError::WrongType(TokenType::Refresh))
        ));
    }

    #[test]
    fn tokens_issued_together_are_distinct() {
        let service = TokenService::new(test_config());
        let id = Uuid::new_v4();

        assert_ne!(
            service.generate_refresh_token(id).unwrap(),
            service.generate_refresh_token(id).unwrap()
        );
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let service = TokenService::new(test_config());
        let other = TokenService::new(TokenConfig {
            access_secret: "someone-else".into(),
            ..test_config()
        });

        let token = other.generate_access_token(&user()).unwrap();
        assert!(service.validate_access_token(&token).is_err());
    }

    fn clear_env() {
        for var in [
            "ACCESS_TOKEN_SECRET",
            "REFRESH_TOKEN_SECRET",
            "ACCESS_TOKEN_EXPIRY",
            "REFRESH_TOKEN_EXPIRY",
        ] {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn config_requires_both_secrets() {
        clear_env();
        assert!(TokenConfig::from_env().is_err());

        unsafe {
            std::env::set_var("ACCESS_TOKEN_SECRET", "a");
        }
        assert!(TokenConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn config_rejects_shared_secret() {
        clear_env();
        unsafe {
            std::env::set_var("ACCESS_TOKEN_SECRET", "same");
            std::env::set_var("REFRESH_TOKEN_SECRET", "same");
        }
        assert!(TokenConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn config_defaults_expiries() {
        clear_env();
        unsafe {
            std::env::set_var("ACCESS_TOKEN_SECRET", "a");
            std::env::set_var("REFRESH_TOKEN_SECRET", "b");
            std::env::set_var("ACCESS_TOKEN_EXPIRY", "900");
        }

        let config = TokenConfig::from_env().unwrap();
        assert_eq!(config.access_token_expiry, 900);
        assert_eq!(config.refresh_token_expiry, 604_800);
        clear_env();
    }
}

//! Verification of access tokens issued by the hosted auth service.
//!
//! The hosted auth service signs access tokens with HS256 using the project
//! JWT secret. This service never issues user tokens itself; `encode_claims`
//! exists so that tooling and tests can mint tokens with the same secret.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Application metadata the hosted auth service embeds in tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Role string mirrored from the profile, when the auth hook sets it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Claims carried by a hosted-auth access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (auth user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Audience, `authenticated` for signed-in users
    pub aud: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Database role used by the hosted backend (`authenticated`, `anon`, ...)
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

/// Default leeway in seconds for clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Audience of tokens issued to signed-in users.
pub const DEFAULT_AUDIENCE: &str = "authenticated";

/// Verifier for hosted-auth access tokens.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    audience: String,
    /// Leeway in seconds for clock skew tolerance (default: 30)
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("audience", &self.audience)
            .field("leeway_secs", &self.leeway_secs)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl JwtConfig {
    /// Creates a verifier from the project JWT secret with default audience and leeway.
    pub fn new(secret: &str) -> Result<Self, JwtError> {
        Self::with_options(secret, DEFAULT_AUDIENCE, DEFAULT_LEEWAY_SECS)
    }

    /// Creates a verifier with a custom audience and leeway.
    pub fn with_options(secret: &str, audience: &str, leeway_secs: u64) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidKey("JWT secret is empty".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            audience: audience.to_string(),
            leeway_secs,
        })
    }

    /// Validates a token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;
        validation.set_audience(&[self.audience.as_str()]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidAudience => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Signs claims with the project secret.
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }
}

/// Extracts user ID from validated claims.
pub fn extract_user_id(claims: &Claims) -> Result<Uuid, JwtError> {
    Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SECRET: &str = "test_secret_key_for_jwt_testing_12345";

    fn claims_for(user_id: Uuid, exp_offset: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: user_id.to_string(),
            exp: now + exp_offset,
            iat: now,
            aud: DEFAULT_AUDIENCE.to_string(),
            email: Some("user@example.com".to_string()),
            role: Some("authenticated".to_string()),
            app_metadata: AppMetadata {
                role: Some("staff".to_string()),
            },
        }
    }

    #[test]
    fn test_validate_roundtrip() {
        let config = JwtConfig::new(SECRET).unwrap();
        let user_id = Uuid::new_v4();
        let token = config.encode_claims(&claims_for(user_id, 3600)).unwrap();

        let claims = config.validate_token(&token).unwrap();
        assert_eq!(extract_user_id(&claims).unwrap(), user_id);
        assert_eq!(claims.app_metadata.role.as_deref(), Some("staff"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = JwtConfig::with_options(SECRET, DEFAULT_AUDIENCE, 0).unwrap();
        let token = config
            .encode_claims(&claims_for(Uuid::new_v4(), -120))
            .unwrap();
        assert!(matches!(
            config.validate_token(&token),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtConfig::new("another-secret").unwrap();
        let verifier = JwtConfig::new(SECRET).unwrap();
        let token = issuer
            .encode_claims(&claims_for(Uuid::new_v4(), 3600))
            .unwrap();
        assert!(matches!(
            verifier.validate_token(&token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let config = JwtConfig::new(SECRET).unwrap();
        let mut claims = claims_for(Uuid::new_v4(), 3600);
        claims.aud = "anon".to_string();
        let token = config.encode_claims(&claims).unwrap();
        assert!(config.validate_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let config = JwtConfig::new(SECRET).unwrap();
        assert!(config.validate_token("not.a.jwt").is_err());
    }

    #[test]
    fn test_empty_secret_is_invalid_key() {
        assert!(matches!(JwtConfig::new(""), Err(JwtError::InvalidKey(_))));
    }

    #[test]
    fn test_extract_user_id_invalid_subject() {
        let mut claims = claims_for(Uuid::new_v4(), 3600);
        claims.sub = "not-a-uuid".to_string();
        assert!(extract_user_id(&claims).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = JwtConfig::new(SECRET).unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(SECRET));
    }
}

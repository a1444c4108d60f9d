//! WebAuthn challenge models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Ceremony a challenge was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeType {
    Registration,
    Authentication,
}

impl ChallengeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::Registration => "registration",
            ChallengeType::Authentication => "authentication",
        }
    }
}

impl FromStr for ChallengeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(ChallengeType::Registration),
            "authentication" => Ok(ChallengeType::Authentication),
            _ => Err(format!("Invalid challenge type: {}", s)),
        }
    }
}

impl fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored challenge awaiting its ceremony response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WebAuthnChallenge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub challenge: String,
    pub challenge_type: ChallengeType,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Body of the `store-webauthn-challenge` function.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct StoreChallengeRequest {
    #[validate(length(min = 16, max = 1024, message = "Challenge must be 16-1024 characters"))]
    #[validate(custom(function = "validate_challenge_encoding"))]
    pub challenge: String,

    pub challenge_type: ChallengeType,
}

fn validate_challenge_encoding(challenge: &str) -> Result<(), ValidationError> {
    if shared::crypto::is_base64url(challenge) {
        Ok(())
    } else {
        let mut err = ValidationError::new("challenge_encoding");
        err.message = Some("Challenge must be base64url encoded".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_challenge_request_validation() {
        let valid = StoreChallengeRequest {
            challenge: "dGVzdC1jaGFsbGVuZ2UtYnl0ZXM".to_string(),
            challenge_type: ChallengeType::Registration,
        };
        assert!(valid.validate().is_ok());

        let too_short = StoreChallengeRequest {
            challenge: "abc".to_string(),
            challenge_type: ChallengeType::Authentication,
        };
        assert!(too_short.validate().is_err());

        let bad_encoding = StoreChallengeRequest {
            challenge: "not base64 url at all!!".to_string(),
            challenge_type: ChallengeType::Authentication,
        };
        assert!(bad_encoding.validate().is_err());
    }

    #[test]
    fn test_challenge_type_json() {
        let parsed: StoreChallengeRequest = serde_json::from_str(
            r#"{"challenge":"dGVzdC1jaGFsbGVuZ2UtYnl0ZXM","challenge_type":"authentication"}"#,
        )
        .unwrap();
        assert_eq!(parsed.challenge_type, ChallengeType::Authentication);
        assert!(serde_json::from_str::<StoreChallengeRequest>(
            r#"{"challenge":"dGVzdC1jaGFsbGVuZ2UtYnl0ZXM","challenge_type":"login"}"#
        )
        .is_err());
    }
}

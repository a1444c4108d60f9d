//! WebAuthn challenge entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::webauthn::ChallengeType;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the webauthn_challenges table.
#[derive(Debug, Clone, FromRow)]
pub struct WebAuthnChallengeEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub challenge: String,
    pub challenge_type: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<WebAuthnChallengeEntity> for domain::models::WebAuthnChallenge {
    fn from(entity: WebAuthnChallengeEntity) -> Self {
        let challenge_type = entity
            .challenge_type
            .parse::<ChallengeType>()
            .unwrap_or(ChallengeType::Authentication);

        Self {
            id: entity.id,
            user_id: entity.user_id,
            challenge: entity.challenge,
            challenge_type,
            expires_at: entity.expires_at,
            created_at: entity.created_at,
        }
    }
}

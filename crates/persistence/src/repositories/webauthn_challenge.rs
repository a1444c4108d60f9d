//! WebAuthn challenge repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::WebAuthnChallengeEntity;
use crate::metrics::QueryTimer;

/// Repository for pending WebAuthn challenges.
#[derive(Clone)]
pub struct WebAuthnChallengeRepository {
    pool: PgPool,
}

impl WebAuthnChallengeRepository {
    /// Creates a new WebAuthnChallengeRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a challenge, replacing any pending one of the same type for the user.
    pub async fn store(
        &self,
        user_id: Uuid,
        challenge: &str,
        challenge_type: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<WebAuthnChallengeEntity, sqlx::Error> {
        let timer = QueryTimer::new("store_webauthn_challenge");
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM webauthn_challenges WHERE user_id = $1 AND challenge_type = $2")
            .bind(user_id)
            .bind(challenge_type)
            .execute(&mut *tx)
            .await?;

        let stored = sqlx::query_as::<_, WebAuthnChallengeEntity>(
            r#"
            INSERT INTO webauthn_challenges (user_id, challenge, challenge_type, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, challenge, challenge_type, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(challenge)
        .bind(challenge_type)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(stored)
    }

    /// Delete challenges that expired before `now`.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_expired_webauthn_challenges");
        let result = sqlx::query("DELETE FROM webauthn_challenges WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}

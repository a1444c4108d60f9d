//! Deletes expired WebAuthn challenges.

use chrono::Utc;
use persistence::repositories::WebAuthnChallengeRepository;
use sqlx::PgPool;
use tracing::info;

use super::scheduler::{Job, JobFrequency};

pub struct WebAuthnCleanupJob {
    repo: WebAuthnChallengeRepository,
}

impl WebAuthnCleanupJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: WebAuthnChallengeRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl Job for WebAuthnCleanupJob {
    fn name(&self) -> &'static str {
        "webauthn_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(10)
    }

    async fn execute(&self) -> Result<(), String> {
        let deleted = self
            .repo
            .delete_expired(Utc::now())
            .await
            .map_err(|e| format!("Failed to delete expired challenges: {}", e))?;

        if deleted > 0 {
            info!(deleted, "Expired WebAuthn challenges removed");
        }
        Ok(())
    }
}

//! Stored account roles.
//!
//! `profiles.role` is the authority for what an account may do. The role in a
//! token's `app_metadata` is only a fallback for accounts without a profile
//! row, since admins change roles by updating the profile and tokens issued
//! earlier keep the old claim until they expire.

use async_trait::async_trait;
use persistence::repositories::ProfileRepository;
use sqlx::PgPool;
use uuid::Uuid;

/// Source of stored role strings.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// The stored role string, `None` when the account has no profile.
    async fn stored_role(&self, user_id: Uuid) -> Result<Option<String>, sqlx::Error>;
}

/// Reads roles from the `profiles` table.
#[derive(Clone)]
pub struct ProfileRoles {
    pool: PgPool,
}

impl ProfileRoles {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleDirectory for ProfileRoles {
    async fn stored_role(&self, user_id: Uuid) -> Result<Option<String>, sqlx::Error> {
        ProfileRepository::new(self.pool.clone()).find_role(user_id).await
    }
}

/// Picks the role that governs access: the stored one when present.
pub fn resolve_role(stored: Option<String>, claimed: Option<String>) -> Option<String> {
    match (stored, claimed) {
        (Some(stored), Some(claimed)) => {
            if stored != claimed {
                tracing::debug!(stored = %stored, claimed = %claimed, "Token role is stale");
            }
            Some(stored)
        }
        (stored, claimed) => stored.or(claimed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_role_wins_over_claim() {
        assert_eq!(
            resolve_role(Some("inactive_staff".into()), Some("staff".into())).as_deref(),
            Some("inactive_staff")
        );
        assert_eq!(
            resolve_role(Some("customer".into()), Some("admin".into())).as_deref(),
            Some("customer")
        );
    }

    #[test]
    fn test_claim_used_without_profile() {
        assert_eq!(resolve_role(None, Some("staff".into())).as_deref(), Some("staff"));
        assert_eq!(resolve_role(Some("admin".into()), None).as_deref(), Some("admin"));
        assert_eq!(resolve_role(None, None), None);
    }
}

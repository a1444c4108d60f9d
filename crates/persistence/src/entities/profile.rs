//! Profile entity (database row mapping).

use chrono::{DateTime, Utc};
use shared::roles::{BaseRole, UserRole};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the profiles table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileEntity {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileEntity {
    /// Parsed role. Unrecognized role strings are treated as an inactive
    /// customer so a bad row never grants access.
    pub fn user_role(&self) -> UserRole {
        self.role
            .parse::<UserRole>()
            .unwrap_or_else(|_| UserRole::new(BaseRole::Customer).toggle_active())
    }
}

impl From<ProfileEntity> for domain::models::Profile {
    fn from(entity: ProfileEntity) -> Self {
        let role = entity.user_role();
        Self {
            id: entity.id,
            email: entity.email,
            full_name: entity.full_name,
            phone: entity.phone,
            role,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

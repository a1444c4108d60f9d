//! Profile domain models.
//!
//! A profile mirrors a hosted-auth user; its `id` is the auth user id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::roles::{BaseRole, UserRole};
use uuid::Uuid;
use validator::Validate;

/// Represents a user profile in either portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_active(&self) -> bool {
        self.role.active
    }
}

/// Request to update the caller's own profile.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120, message = "Full name must be 1-120 characters"))]
    pub full_name: Option<String>,

    #[validate(length(min = 7, max = 20, message = "Phone must be 7-20 characters"))]
    pub phone: Option<String>,
}

/// Request to change a profile's base role.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SetRoleRequest {
    pub role: BaseRole,
}

/// Response after toggling or changing a role.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RoleChangeResponse {
    pub id: Uuid,
    pub previous_role: UserRole,
    pub role: UserRole,
    pub active: bool,
}

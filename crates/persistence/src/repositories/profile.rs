//! Profile repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ProfileEntity;
use crate::metrics::QueryTimer;

const PROFILE_COLUMNS: &str = "id, email, full_name, phone, role, created_at, updated_at";

/// Repository for profile-related database operations.
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Creates a new ProfileRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a profile by its auth user id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_profile_by_id");
        let result = sqlx::query_as::<_, ProfileEntity>(&format!(
            "SELECT {} FROM profiles WHERE id = $1",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Role string of a profile, used when a token carries no role claim.
    pub async fn find_role(&self, id: Uuid) -> Result<Option<String>, sqlx::Error> {
        let timer = QueryTimer::new("find_profile_role");
        let result = sqlx::query_scalar::<_, String>("SELECT role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// One page of profiles, newest first. Fetches `limit + 1` rows so the
    /// caller can tell whether another page exists.
    pub async fn list_page(
        &self,
        cursor: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> Result<Vec<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_profiles_page");
        let (cursor_ts, cursor_id) = cursor.unzip();
        let result = sqlx::query_as::<_, ProfileEntity>(&format!(
            r#"
            SELECT {}
            FROM profiles
            WHERE ($1::timestamptz IS NULL OR (created_at, id) < ($1, $2))
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
            PROFILE_COLUMNS
        ))
        .bind(cursor_ts)
        .bind(cursor_id)
        .bind(limit + 1)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Profiles whose email, name or phone contains the pattern.
    pub async fn search(&self, pattern: &str, limit: i64) -> Result<Vec<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("search_profiles");
        let result = sqlx::query_as::<_, ProfileEntity>(&format!(
            r#"
            SELECT {}
            FROM profiles
            WHERE email ILIKE $1 OR full_name ILIKE $1 OR phone ILIKE $1
            ORDER BY email
            LIMIT $2
            "#,
            PROFILE_COLUMNS
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update contact fields; absent values are left unchanged.
    pub async fn update_contact(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<ProfileEntity, sqlx::Error> {
        let timer = QueryTimer::new("update_profile_contact");
        let result = sqlx::query_as::<_, ProfileEntity>(&format!(
            r#"
            UPDATE profiles
            SET full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(id)
        .bind(full_name)
        .bind(phone)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Replace the role string, but only if it still equals `expected`.
    ///
    /// Returns `None` when the profile is missing or was changed concurrently.
    pub async fn set_role(
        &self,
        id: Uuid,
        expected: &str,
        role: &str,
    ) -> Result<Option<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_profile_role");
        let result = sqlx::query_as::<_, ProfileEntity>(&format!(
            r#"
            UPDATE profiles
            SET role = $3, updated_at = NOW()
            WHERE id = $1 AND role = $2
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        ))
        .bind(id)
        .bind(expected)
        .bind(role)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}

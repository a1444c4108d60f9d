//! Row-level-security policy entity, read from the `pg_policies` catalog view.

use sqlx::FromRow;

/// A row of `pg_policies`.
#[derive(Debug, Clone, FromRow)]
pub struct RlsPolicyEntity {
    pub policyname: String,
    pub tablename: String,
    pub cmd: String,
    pub roles: Vec<String>,
    pub qual: Option<String>,
    pub with_check: Option<String>,
}

impl From<RlsPolicyEntity> for domain::models::rls_policy::PolicyInfo {
    fn from(entity: RlsPolicyEntity) -> Self {
        Self {
            policy_name: entity.policyname,
            table: entity.tablename,
            command: entity.cmd,
            roles: entity.roles,
            using: entity.qual,
            with_check: entity.with_check,
        }
    }
}

//! Row-level-security policy repository.
//!
//! Statements executed here are built by
//! [`ManagePolicyRequest::to_statement`](domain::models::rls_policy::ManagePolicyRequest::to_statement),
//! which only admits allow-listed tables, roles and identifiers.

use sqlx::PgPool;

use crate::entities::RlsPolicyEntity;
use crate::metrics::QueryTimer;

/// Repository for RLS policy management.
#[derive(Clone)]
pub struct RlsPolicyRepository {
    pool: PgPool,
}

impl RlsPolicyRepository {
    /// Creates a new RlsPolicyRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Policies defined on a table in the public schema.
    pub async fn list(&self, table: &str) -> Result<Vec<RlsPolicyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_rls_policies");
        let result = sqlx::query_as::<_, RlsPolicyEntity>(
            r#"
            SELECT policyname::text AS policyname,
                   tablename::text AS tablename,
                   cmd,
                   roles::text[] AS roles,
                   qual,
                   with_check
            FROM pg_policies
            WHERE schemaname = 'public' AND tablename = $1
            ORDER BY policyname
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Execute a validated DDL statement.
    pub async fn execute(&self, statement: &str) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("execute_rls_statement");
        let result = sqlx::query(statement).execute(&self.pool).await;
        timer.record();
        result.map(|_| ())
    }
}

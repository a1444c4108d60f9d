//! Security alert repository for database operations.

use domain::models::security_alert::NewSecurityAlert;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::SecurityAlertEntity;
use crate::metrics::QueryTimer;

const ALERT_COLUMNS: &str = "id, user_id, alert_type, severity, message, metadata, resolved, \
     resolved_by, resolved_at, created_at";

/// Repository for security alerts.
#[derive(Clone)]
pub struct SecurityAlertRepository {
    pool: PgPool,
}

impl SecurityAlertRepository {
    /// Creates a new SecurityAlertRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, alert: &NewSecurityAlert) -> Result<SecurityAlertEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_security_alert");
        let result = sqlx::query_as::<_, SecurityAlertEntity>(&format!(
            r#"
            INSERT INTO security_alerts (user_id, alert_type, severity, message, metadata)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ALERT_COLUMNS
        ))
        .bind(alert.user_id)
        .bind(alert.alert_type.as_str())
        .bind(alert.severity.as_str())
        .bind(&alert.message)
        .bind(&alert.metadata)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Newest alerts first; `unresolved_only` hides resolved ones.
    pub async fn list(&self, unresolved_only: bool) -> Result<Vec<SecurityAlertEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_security_alerts");
        let result = sqlx::query_as::<_, SecurityAlertEntity>(&format!(
            r#"
            SELECT {}
            FROM security_alerts
            WHERE ($1 = false OR resolved = false)
            ORDER BY created_at DESC
            LIMIT 500
            "#,
            ALERT_COLUMNS
        ))
        .bind(unresolved_only)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Mark an alert resolved. Returns `None` if it does not exist.
    pub async fn resolve(
        &self,
        id: Uuid,
        resolved_by: Uuid,
    ) -> Result<Option<SecurityAlertEntity>, sqlx::Error> {
        let timer = QueryTimer::new("resolve_security_alert");
        let result = sqlx::query_as::<_, SecurityAlertEntity>(&format!(
            r#"
            UPDATE security_alerts
            SET resolved = true,
                resolved_by = COALESCE(resolved_by, $2),
                resolved_at = COALESCE(resolved_at, NOW())
            WHERE id = $1
            RETURNING {}
            "#,
            ALERT_COLUMNS
        ))
        .bind(id)
        .bind(resolved_by)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}

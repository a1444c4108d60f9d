//! Security alert entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::security_alert::{AlertSeverity, AlertType};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the security_alerts table.
#[derive(Debug, Clone, FromRow)]
pub struct SecurityAlertEntity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub alert_type: String,
    pub severity: String,
    pub message: String,
    pub metadata: serde_json::Value,
    pub resolved: bool,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SecurityAlertEntity {
    /// Convert to domain model. Rows with an alert type this build does not
    /// know are skipped.
    pub fn into_domain(self) -> Option<domain::models::SecurityAlert> {
        let alert_type = self.alert_type.parse::<AlertType>().ok()?;
        let severity = self
            .severity
            .parse::<AlertSeverity>()
            .unwrap_or_else(|_| alert_type.default_severity());

        Some(domain::models::SecurityAlert {
            id: self.id,
            user_id: self.user_id,
            alert_type,
            severity,
            message: self.message,
            metadata: self.metadata,
            resolved: self.resolved,
            resolved_by: self.resolved_by,
            resolved_at: self.resolved_at,
            created_at: self.created_at,
        })
    }
}

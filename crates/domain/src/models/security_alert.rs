//! Security alert domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of event that raised an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    ImpersonationStarted,
    RoleChanged,
    AccountStatusChanged,
    RlsPolicyChanged,
    InvitationSent,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::ImpersonationStarted => "impersonation_started",
            AlertType::RoleChanged => "role_changed",
            AlertType::AccountStatusChanged => "account_status_changed",
            AlertType::RlsPolicyChanged => "rls_policy_changed",
            AlertType::InvitationSent => "invitation_sent",
        }
    }

    /// Severity assigned to newly raised alerts of this type.
    pub fn default_severity(&self) -> AlertSeverity {
        match self {
            AlertType::InvitationSent => AlertSeverity::Info,
            AlertType::ImpersonationStarted
            | AlertType::RoleChanged
            | AlertType::AccountStatusChanged => AlertSeverity::Warning,
            AlertType::RlsPolicyChanged => AlertSeverity::Critical,
        }
    }
}

impl FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "impersonation_started" => Ok(AlertType::ImpersonationStarted),
            "role_changed" => Ok(AlertType::RoleChanged),
            "account_status_changed" => Ok(AlertType::AccountStatusChanged),
            "rls_policy_changed" => Ok(AlertType::RlsPolicyChanged),
            "invitation_sent" => Ok(AlertType::InvitationSent),
            _ => Err(format!("Invalid alert type: {}", s)),
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl FromStr for AlertSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(AlertSeverity::Info),
            "warning" => Ok(AlertSeverity::Warning),
            "critical" => Ok(AlertSeverity::Critical),
            _ => Err(format!("Invalid alert severity: {}", s)),
        }
    }
}

/// A recorded security alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SecurityAlert {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub metadata: serde_json::Value,
    pub resolved: bool,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// An alert about to be recorded.
#[derive(Debug, Clone)]
pub struct NewSecurityAlert {
    pub user_id: Option<Uuid>,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub metadata: serde_json::Value,
}

impl NewSecurityAlert {
    /// Builds an alert with the type's default severity.
    pub fn new(alert_type: AlertType, user_id: Option<Uuid>, message: impl Into<String>) -> Self {
        Self {
            user_id,
            alert_type,
            severity: alert_type.default_severity(),
            message: message.into(),
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Query parameters for listing alerts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityAlertFilter {
    pub unresolved: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_severity() {
        assert_eq!(
            AlertType::RlsPolicyChanged.default_severity(),
            AlertSeverity::Critical
        );
        assert_eq!(
            AlertType::InvitationSent.default_severity(),
            AlertSeverity::Info
        );
        assert!(AlertSeverity::Critical > AlertSeverity::Warning);
    }

    #[test]
    fn test_new_alert_builder() {
        let user_id = Uuid::new_v4();
        let alert = NewSecurityAlert::new(AlertType::RoleChanged, Some(user_id), "Role changed")
            .with_metadata(serde_json::json!({"from": "staff", "to": "admin"}));
        assert_eq!(alert.severity, AlertSeverity::Warning);
        assert_eq!(alert.metadata["to"], "admin");
    }

    #[test]
    fn test_alert_type_roundtrip() {
        for t in [
            AlertType::ImpersonationStarted,
            AlertType::RoleChanged,
            AlertType::AccountStatusChanged,
            AlertType::RlsPolicyChanged,
            AlertType::InvitationSent,
        ] {
            assert_eq!(t.as_str().parse::<AlertType>(), Ok(t));
        }
    }
}

//! Impersonation and test-mode overlay.
//!
//! An administrator can view the portals as another user (impersonation) or as
//! a test account of any base role (test mode). The overlay travels with each
//! request as base64url JSON and only changes the *effective* identity;
//! authorization keeps using the real one.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::roles::{BaseRole, UserRole};
use thiserror::Error;
use uuid::Uuid;

/// Request header carrying the encoded overlay.
pub const OVERLAY_HEADER: &str = "x-impersonation";

/// Errors decoding an overlay.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Overlay is not valid base64url")]
    Encoding,

    #[error("Overlay is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Impersonation overlay requires user_id and role")]
    MissingTarget,

    #[error("Test mode overlay requires a role")]
    MissingRole,
}

/// Overlay mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayMode {
    Impersonate,
    Test,
}

/// The overlay state a client presents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub mode: OverlayMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl Overlay {
    /// Overlay that views the portals as `user_id`.
    pub fn impersonate(user_id: Uuid, role: UserRole, email: impl Into<String>) -> Self {
        Self {
            mode: OverlayMode::Impersonate,
            user_id: Some(user_id),
            role: Some(role),
            email: Some(email.into()),
            started_at: Utc::now(),
        }
    }

    /// Overlay that previews a portal as a test account of `base`.
    pub fn test_mode(base: BaseRole) -> Self {
        Self {
            mode: OverlayMode::Test,
            user_id: None,
            role: Some(UserRole::new(base).as_test()),
            email: None,
            started_at: Utc::now(),
        }
    }

    pub fn encode(&self) -> Result<String, OverlayError> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(raw: &str) -> Result<Self, OverlayError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(raw.trim().trim_end_matches('='))
            .map_err(|_| OverlayError::Encoding)?;
        let overlay: Overlay = serde_json::from_slice(&bytes)?;

        match overlay.mode {
            OverlayMode::Impersonate if overlay.user_id.is_none() || overlay.role.is_none() => {
                Err(OverlayError::MissingTarget)
            }
            OverlayMode::Test if overlay.role.is_none() => Err(OverlayError::MissingRole),
            _ => Ok(overlay),
        }
    }
}

/// Who a request acts as.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: UserRole,
}

/// Effective identity for a real caller and an optional overlay.
///
/// Returns the real identity unchanged when there is no overlay or the caller
/// is not an active administrator.
pub fn apply(real: &Identity, overlay: Option<&Overlay>) -> Identity {
    let Some(overlay) = overlay else {
        return real.clone();
    };
    if !real.role.can_administer() {
        return real.clone();
    }

    match overlay.mode {
        OverlayMode::Impersonate => match (overlay.user_id, overlay.role) {
            (Some(user_id), Some(role)) => Identity {
                user_id,
                email: overlay.email.clone(),
                role,
            },
            _ => real.clone(),
        },
        OverlayMode::Test => match overlay.role {
            Some(role) => Identity {
                user_id: real.user_id,
                email: real.email.clone(),
                role: UserRole::new(role.base).as_test(),
            },
            None => real.clone(),
        },
    }
}

/// Response body of the session endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub real: Identity,
    pub effective: Identity,
    pub impersonating: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<OverlayMode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: &str) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: Some("owner@shop.test".to_string()),
            role: role.parse().unwrap(),
        }
    }

    #[test]
    fn test_encode_decode() {
        let target = Uuid::new_v4();
        let overlay = Overlay::impersonate(target, "customer".parse().unwrap(), "c@example.com");
        let encoded = overlay.encode().unwrap();
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert_eq!(Overlay::decode(&encoded).unwrap(), overlay);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(Overlay::decode("***"), Err(OverlayError::Encoding)));
        let not_json = URL_SAFE_NO_PAD.encode("hello");
        assert!(matches!(Overlay::decode(&not_json), Err(OverlayError::Json(_))));
        let no_target = URL_SAFE_NO_PAD.encode(r#"{"mode":"impersonate","started_at":"2024-01-01T00:00:00Z"}"#);
        assert!(matches!(Overlay::decode(&no_target), Err(OverlayError::MissingTarget)));
    }

    #[test]
    fn test_impersonation_applies_for_admin() {
        let admin = identity("admin");
        let target = Uuid::new_v4();
        let overlay = Overlay::impersonate(target, "customer".parse().unwrap(), "c@example.com");

        let effective = apply(&admin, Some(&overlay));
        assert_eq!(effective.user_id, target);
        assert_eq!(effective.role.base, BaseRole::Customer);
        assert_eq!(effective.email.as_deref(), Some("c@example.com"));
    }

    #[test]
    fn test_overlay_ignored_for_non_admins() {
        let overlay = Overlay::test_mode(BaseRole::Admin);
        for role in ["staff", "customer", "inactive_admin"] {
            let real = identity(role);
            assert_eq!(apply(&real, Some(&overlay)), real);
        }
    }

    #[test]
    fn test_test_mode_keeps_user() {
        let admin = identity("admin");
        let effective = apply(&admin, Some(&Overlay::test_mode(BaseRole::Customer)));
        assert_eq!(effective.user_id, admin.user_id);
        assert_eq!(effective.role.to_string(), "test_customer");
    }

    #[test]
    fn test_no_overlay_is_identity() {
        let admin = identity("admin");
        assert_eq!(apply(&admin, None), admin);
    }
}

//! Caller identity extractors.
//!
//! [`CurrentUser`] carries both the real caller and the effective identity
//! after the impersonation overlay (`X-Impersonation`) is applied.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::services::{impersonation, Identity, Overlay, SessionInfo, OVERLAY_HEADER};
use shared::roles::BaseRole;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::rbac::{check_access, STAFF_SIDE};
use crate::middleware::user_auth::{bearer_token, AuthUser};

/// Authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Who signed in. Authorization and data ownership use this.
    pub real: Identity,
    /// Who "my data" views are rendered for.
    pub effective: Identity,
    /// The overlay in force, only when the real caller may use one.
    pub overlay: Option<Overlay>,
}

impl CurrentUser {
    /// Combines a real identity with the raw overlay header, if any.
    pub fn resolve(real: Identity, raw_overlay: Option<&str>) -> Result<Self, ApiError> {
        let Some(raw) = raw_overlay.filter(|r| !r.trim().is_empty()) else {
            return Ok(Self {
                effective: real.clone(),
                real,
                overlay: None,
            });
        };

        let overlay = Overlay::decode(raw)?;
        if !real.role.can_administer() {
            tracing::warn!(
                user_id = %real.user_id,
                role = %real.role,
                "Ignoring impersonation overlay from non-admin caller"
            );
            return Ok(Self {
                effective: real.clone(),
                real,
                overlay: None,
            });
        }

        let effective = impersonation::apply(&real, Some(&overlay));
        Ok(Self {
            real,
            effective,
            overlay: Some(overlay),
        })
    }

    /// Refuses the request unless the real role is in `allowed`.
    pub fn require(&self, allowed: &[BaseRole]) -> Result<(), ApiError> {
        check_access(&self.real, allowed).map_err(|denied| ApiError::Forbidden(denied.message().to_string()))
    }

    pub fn is_staff_side(&self) -> bool {
        self.real.role.is_staff_side()
    }

    /// Owner filter for list queries: `None` (everything) for the staff side,
    /// the caller's own id for customers.
    pub fn owner_scope(&self) -> Option<Uuid> {
        if self.is_staff_side() {
            None
        } else {
            Some(self.real.user_id)
        }
    }

    /// Customers only reach rows they own. Foreign rows look missing.
    pub fn ensure_owns(&self, owner_id: Uuid, what: &str) -> Result<(), ApiError> {
        if self.is_staff_side() || owner_id == self.real.user_id {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("{} not found", what)))
        }
    }

    /// Like [`require`](Self::require) for the staff side.
    pub fn require_staff(&self) -> Result<(), ApiError> {
        self.require(STAFF_SIDE)
    }

    pub fn session_info(&self) -> SessionInfo {
        SessionInfo {
            real: self.real.clone(),
            effective: self.effective.clone(),
            impersonating: self.overlay.is_some(),
            mode: self.overlay.as_ref().map(|o| o.mode),
        }
    }
}

fn overlay_header(parts: &Parts) -> Result<Option<&str>, ApiError> {
    match parts.headers.get(OVERLAY_HEADER) {
        None => Ok(None),
        Some(value) => value.to_str().map(Some).map_err(|_| {
            ApiError::Validation("Malformed impersonation header: not ASCII".to_string())
        }),
    }
}

async fn real_identity(parts: &Parts, state: &AppState) -> Result<Option<Identity>, ApiError> {
    // Set by require_user_auth / optional_user_auth when they ran
    if let Some(auth) = parts.extensions.get::<AuthUser>() {
        return Ok(Some(auth.identity.clone()));
    }

    match bearer_token(&parts.headers) {
        Some(token) => Ok(Some(AuthUser::authenticate(state, token).await?.identity)),
        None => Ok(None),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let real = real_identity(parts, state)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
        CurrentUser::resolve(real, overlay_header(parts)?)
    }
}

/// Caller identity on routes that also serve anonymous requests.
#[derive(Debug, Clone)]
pub struct OptionalCurrentUser(pub Option<CurrentUser>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalCurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth) = parts.extensions.get::<AuthUser>() {
            let real = auth.identity.clone();
            return Ok(Self(Some(CurrentUser::resolve(real, overlay_header(parts)?)?)));
        }

        if bearer_token(&parts.headers).is_none() {
            return Ok(Self(None));
        }

        // Bad credentials on an optional route behave like no credentials
        match real_identity(parts, state).await {
            Ok(Some(real)) => Ok(Self(Some(CurrentUser::resolve(real, overlay_header(parts)?)?))),
            Ok(None) | Err(ApiError::Unauthorized(_)) => Ok(Self(None)),
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::OverlayMode;

    fn identity(role: &str) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: Some("someone@shop.test".to_string()),
            role: role.parse().unwrap(),
        }
    }

    #[test]
    fn test_no_overlay() {
        let real = identity("admin");
        let user = CurrentUser::resolve(real.clone(), None).unwrap();
        assert_eq!(user.effective, real);
        assert!(!user.session_info().impersonating);
    }

    #[test]
    fn test_admin_test_mode() {
        let real = identity("admin");
        let raw = Overlay::test_mode(BaseRole::Customer).encode().unwrap();
        let user = CurrentUser::resolve(real.clone(), Some(&raw)).unwrap();

        assert_eq!(user.real, real);
        assert_eq!(user.effective.user_id, real.user_id);
        assert_eq!(user.effective.role.to_string(), "test_customer");

        let session = user.session_info();
        assert!(session.impersonating);
        assert_eq!(session.mode, Some(OverlayMode::Test));
    }

    #[test]
    fn test_overlay_ignored_for_staff() {
        let real = identity("staff");
        let target = Uuid::new_v4();
        let raw = Overlay::impersonate(target, "admin".parse().unwrap(), "boss@shop.test")
            .encode()
            .unwrap();
        let user = CurrentUser::resolve(real.clone(), Some(&raw)).unwrap();
        assert_eq!(user.effective, real);
        assert!(user.overlay.is_none());
    }

    #[test]
    fn test_ownership_rules() {
        let customer = CurrentUser::resolve(identity("customer"), None).unwrap();
        let own = customer.real.user_id;
        assert_eq!(customer.owner_scope(), Some(own));
        assert!(customer.ensure_owns(own, "Vehicle").is_ok());
        assert!(matches!(
            customer.ensure_owns(Uuid::new_v4(), "Vehicle"),
            Err(ApiError::NotFound(msg)) if msg == "Vehicle not found"
        ));
        assert!(matches!(customer.require_staff(), Err(ApiError::Forbidden(_))));

        let staff = CurrentUser::resolve(identity("staff"), None).unwrap();
        assert_eq!(staff.owner_scope(), None);
        assert!(staff.ensure_owns(Uuid::new_v4(), "Vehicle").is_ok());
        assert!(staff.require_staff().is_ok());
    }

    #[test]
    fn test_malformed_overlay_rejected() {
        let err = CurrentUser::resolve(identity("admin"), Some("%%%")).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}

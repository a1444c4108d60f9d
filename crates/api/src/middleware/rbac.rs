//! Role-based access control middleware.
//!
//! Checks the real caller's role against an allow-list. Runs after
//! `require_user_auth`; the impersonation overlay never affects it.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::Identity;
use serde_json::json;
use shared::roles::BaseRole;

use crate::middleware::user_auth::AuthUser;

/// Admin and staff.
pub const STAFF_SIDE: &[BaseRole] = &[BaseRole::Admin, BaseRole::Staff];

/// Admin only.
pub const ADMIN_ONLY: &[BaseRole] = &[BaseRole::Admin];

/// Why an authenticated caller was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    Inactive,
    Role,
}

impl AccessDenied {
    pub fn message(&self) -> &'static str {
        match self {
            AccessDenied::Inactive => "Account is inactive",
            AccessDenied::Role => "Insufficient role for this resource",
        }
    }
}

/// Whether `identity` may use a resource open to `allowed`.
pub fn check_access(identity: &Identity, allowed: &[BaseRole]) -> Result<(), AccessDenied> {
    if !identity.role.active {
        return Err(AccessDenied::Inactive);
    }
    if !identity.role.is_allowed(allowed) {
        return Err(AccessDenied::Role);
    }
    Ok(())
}

/// Any active account.
pub async fn require_active(req: Request<Body>, next: Next) -> Response {
    require_roles(req, next, &[BaseRole::Admin, BaseRole::Staff, BaseRole::Customer]).await
}

/// Admin or staff.
pub async fn require_staff(req: Request<Body>, next: Next) -> Response {
    require_roles(req, next, STAFF_SIDE).await
}

/// Admin only.
pub async fn require_admin(req: Request<Body>, next: Next) -> Response {
    require_roles(req, next, ADMIN_ONLY).await
}

async fn require_roles(req: Request<Body>, next: Next, allowed: &[BaseRole]) -> Response {
    let Some(auth) = req.extensions().get::<AuthUser>() else {
        return error_response(StatusCode::UNAUTHORIZED, "unauthorized", "Authentication required");
    };

    if let Err(denied) = check_access(&auth.identity, allowed) {
        tracing::info!(
            user_id = %auth.identity.user_id,
            role = %auth.identity.role,
            reason = ?denied,
            "Access denied"
        );
        return error_response(StatusCode::FORBIDDEN, "forbidden", denied.message());
    }

    next.run(req).await
}

fn error_response(status: StatusCode, error: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "error": error,
            "message": message
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn identity(role: &str) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: None,
            role: role.parse().unwrap(),
        }
    }

    #[test]
    fn test_staff_side_access() {
        assert!(check_access(&identity("admin"), STAFF_SIDE).is_ok());
        assert!(check_access(&identity("test_staff"), STAFF_SIDE).is_ok());
        assert_eq!(
            check_access(&identity("customer"), STAFF_SIDE),
            Err(AccessDenied::Role)
        );
    }

    #[test]
    fn test_admin_only_access() {
        assert!(check_access(&identity("admin"), ADMIN_ONLY).is_ok());
        assert_eq!(
            check_access(&identity("staff"), ADMIN_ONLY),
            Err(AccessDenied::Role)
        );
    }

    #[test]
    fn test_inactive_is_refused_before_role() {
        assert_eq!(
            check_access(&identity("inactive_admin"), ADMIN_ONLY),
            Err(AccessDenied::Inactive)
        );
        assert_eq!(AccessDenied::Inactive.message(), "Account is inactive");
    }
}

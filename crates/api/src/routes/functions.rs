//! Serverless function handlers under `/functions/v1/:name`.
//!
//! Functions speak a smaller error envelope than the data API: every failure
//! renders `{ "error": message }`, and every response, failures included,
//! carries the browser CORS headers.

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{Duration, Utc};
use domain::models::invitation::{
    SendInvitationRequest, SendInvitationResponse, SendNotificationRequest,
};
use domain::models::rls_policy::{ManagePolicyRequest, PolicyAction, PolicyInfo, PolicyRequestError};
use domain::models::webauthn::StoreChallengeRequest;
use domain::models::{AlertType, NewSecurityAlert};
use domain::services::Identity;
use persistence::repositories::{RlsPolicyRepository, WebAuthnChallengeRepository};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use shared::roles::BaseRole;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_function_call;
use crate::middleware::rbac::{check_access, ADMIN_ONLY, STAFF_SIDE};
use crate::middleware::AuthUser;
use crate::routes::record_alert;
use crate::services::{AuthAdminError, EmailError, Invite};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
pub const ALLOW_METHODS: &str = "POST, OPTIONS";

/// Failure of a function call.
#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Function '{0}' not found")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Carries a fixed client-facing message; details go to the log.
    #[error("{0}")]
    Internal(&'static str),
}

impl FunctionError {
    pub fn status(&self) -> StatusCode {
        match self {
            FunctionError::BadRequest(_) => StatusCode::BAD_REQUEST,
            FunctionError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            FunctionError::Forbidden(_) => StatusCode::FORBIDDEN,
            FunctionError::NotFound(_) => StatusCode::NOT_FOUND,
            FunctionError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            FunctionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<sqlx::Error> for FunctionError {
    fn from(err: sqlx::Error) -> Self {
        error!(error = %err, "Function database call failed");
        FunctionError::Internal("Database request failed")
    }
}

impl From<validator::ValidationErrors> for FunctionError {
    fn from(errors: validator::ValidationErrors) -> Self {
        FunctionError::BadRequest(ApiError::from(errors).public_message())
    }
}

impl From<PolicyRequestError> for FunctionError {
    fn from(err: PolicyRequestError) -> Self {
        FunctionError::BadRequest(err.to_string())
    }
}

impl From<EmailError> for FunctionError {
    fn from(err: EmailError) -> Self {
        error!(error = %err, "Notification email failed");
        FunctionError::Internal("Failed to send notification")
    }
}

impl From<AuthAdminError> for FunctionError {
    fn from(err: AuthAdminError) -> Self {
        match err {
            // Hosted auth refuses duplicates and malformed addresses with 4xx
            AuthAdminError::Rejected { status, message } if (400..500).contains(&status) => {
                FunctionError::BadRequest(message)
            }
            other => {
                error!(error = %other, "Invitation request failed");
                FunctionError::Internal("Failed to send invitation")
            }
        }
    }
}

/// The functions this deployment serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    SendInvitation,
    SendNotification,
    StoreWebAuthnChallenge,
    ManageRlsPolicies,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "send-invitation" => Some(Function::SendInvitation),
            "send-notification" => Some(Function::SendNotification),
            "store-webauthn-challenge" => Some(Function::StoreWebAuthnChallenge),
            "manage-rls-policies" => Some(Function::ManageRlsPolicies),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::SendInvitation => "send-invitation",
            Function::SendNotification => "send-notification",
            Function::StoreWebAuthnChallenge => "store-webauthn-challenge",
            Function::ManageRlsPolicies => "manage-rls-policies",
        }
    }

    /// Roles allowed to call the function.
    pub fn allowed_roles(&self) -> &'static [BaseRole] {
        match self {
            Function::SendInvitation | Function::SendNotification => STAFF_SIDE,
            Function::StoreWebAuthnChallenge => BaseRole::ALL,
            Function::ManageRlsPolicies => ADMIN_ONLY,
        }
    }
}

/// Adds the CORS headers to every function response.
pub async fn function_cors(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    response
}

/// Any method on `/functions/v1/:name`.
pub async fn invoke_function(
    State(state): State<AppState>,
    Path(name): Path<String>,
    method: Method,
    auth: Option<Extension<AuthUser>>,
    body: Bytes,
) -> Response {
    if method == Method::OPTIONS {
        return (StatusCode::OK, "ok").into_response();
    }

    let result = dispatch(&state, &name, method, auth.map(|Extension(a)| a), body).await;
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => e.status(),
    };
    record_function_call(&name, status);

    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) => {
            if e.status().is_server_error() {
                error!(function = %name, error = %e, "Function failed");
            } else {
                info!(function = %name, status = status.as_u16(), error = %e, "Function refused");
            }
            e.into_response()
        }
    }
}

async fn dispatch(
    state: &AppState,
    name: &str,
    method: Method,
    auth: Option<AuthUser>,
    body: Bytes,
) -> Result<Value, FunctionError> {
    if method != Method::POST {
        return Err(FunctionError::MethodNotAllowed);
    }
    let function =
        Function::from_name(name).ok_or_else(|| FunctionError::NotFound(name.to_string()))?;

    let caller = auth
        .map(|a| a.identity)
        .ok_or_else(|| FunctionError::Unauthorized("Missing or invalid authorization".to_string()))?;
    check_access(&caller, function.allowed_roles())
        .map_err(|denied| FunctionError::Forbidden(denied.message().to_string()))?;

    match function {
        Function::SendInvitation => send_invitation(state, &caller, parse(&body)?).await,
        Function::SendNotification => send_notification(state, &caller, parse(&body)?).await,
        Function::StoreWebAuthnChallenge => store_challenge(state, &caller, parse(&body)?).await,
        Function::ManageRlsPolicies => manage_policies(state, &caller, parse(&body)?).await,
    }
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, FunctionError> {
    if body.is_empty() {
        return Err(FunctionError::BadRequest("Request body is required".to_string()));
    }
    serde_json::from_slice(body).map_err(|e| FunctionError::BadRequest(format!("Invalid JSON: {}", e)))
}

fn to_value<T: Serialize>(value: T) -> Result<Value, FunctionError> {
    serde_json::to_value(value).map_err(|e| {
        error!(error = %e, "Failed to encode function response");
        FunctionError::Internal("Failed to encode response")
    })
}

async fn send_invitation(
    state: &AppState,
    caller: &Identity,
    request: SendInvitationRequest,
) -> Result<Value, FunctionError> {
    request.validate()?;
    let role = request.role();
    if role.is_staff_side() && !caller.role.can_administer() {
        return Err(FunctionError::Forbidden(
            "Only administrators can invite staff".to_string(),
        ));
    }

    let user_id: Uuid = state
        .auth_admin
        .invite_user(&Invite {
            email: &request.email,
            full_name: request.full_name.as_deref(),
            role,
            redirect_to: request.redirect_to.as_deref(),
        })
        .await?;

    record_alert(
        state,
        NewSecurityAlert::new(
            AlertType::InvitationSent,
            Some(caller.user_id),
            format!("Invitation sent to {} as {}", request.email, role),
        )
        .with_metadata(json!({ "invited_user_id": user_id, "role": role.as_str() })),
    )
    .await;

    info!(invited_by = %caller.user_id, user_id = %user_id, role = %role, "Invitation sent");
    to_value(SendInvitationResponse {
        success: true,
        user_id: Some(user_id),
        message: format!("Invitation sent to {}", request.email),
    })
}

async fn send_notification(
    state: &AppState,
    caller: &Identity,
    request: SendNotificationRequest,
) -> Result<Value, FunctionError> {
    request.validate()?;
    if !state.email.is_enabled() {
        warn!("Notification requested with email disabled");
    }
    state.email.send_notification(&request).await?;

    info!(sent_by = %caller.user_id, category = ?request.category, "Notification sent");
    Ok(json!({ "success": true }))
}

async fn store_challenge(
    state: &AppState,
    caller: &Identity,
    request: StoreChallengeRequest,
) -> Result<Value, FunctionError> {
    request.validate()?;
    let expires_at = Utc::now() + Duration::seconds(state.config.auth.webauthn_challenge_ttl_secs);

    let stored = WebAuthnChallengeRepository::new(state.pool.clone())
        .store(
            caller.user_id,
            &request.challenge,
            request.challenge_type.as_str(),
            expires_at,
        )
        .await?;

    info!(
        user_id = %caller.user_id,
        challenge_type = %request.challenge_type,
        "WebAuthn challenge stored"
    );
    Ok(json!({ "success": true, "id": stored.id, "expires_at": stored.expires_at }))
}

async fn manage_policies(
    state: &AppState,
    caller: &Identity,
    request: ManagePolicyRequest,
) -> Result<Value, FunctionError> {
    let repo = RlsPolicyRepository::new(state.pool.clone());
    let Some(statement) = request.to_statement()? else {
        let policies: Vec<PolicyInfo> = repo
            .list(&request.table)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        return Ok(json!({ "success": true, "policies": policies }));
    };

    repo.execute(&statement).await?;

    let action = match request.action {
        PolicyAction::Create => "create",
        PolicyAction::Drop => "drop",
        PolicyAction::Enable => "enable",
        PolicyAction::List => "list",
    };
    record_alert(
        state,
        NewSecurityAlert::new(
            AlertType::RlsPolicyChanged,
            Some(caller.user_id),
            format!("RLS policy {} on {}", action, request.table),
        )
        .with_metadata(json!({
            "action": action,
            "table": request.table,
            "policy_name": request.policy_name,
        })),
    )
    .await;

    warn!(admin_id = %caller.user_id, table = %request.table, action, "RLS policy changed");
    Ok(json!({ "success": true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_names() {
        for function in [
            Function::SendInvitation,
            Function::SendNotification,
            Function::StoreWebAuthnChallenge,
            Function::ManageRlsPolicies,
        ] {
            assert_eq!(Function::from_name(function.name()), Some(function));
        }
        assert_eq!(Function::from_name("delete-everything"), None);
    }

    #[test]
    fn test_function_roles() {
        assert!(!Function::ManageRlsPolicies
            .allowed_roles()
            .contains(&BaseRole::Staff));
        assert!(Function::SendNotification
            .allowed_roles()
            .contains(&BaseRole::Staff));
        assert!(Function::StoreWebAuthnChallenge
            .allowed_roles()
            .contains(&BaseRole::Customer));
    }

    #[test]
    fn test_error_envelope_status() {
        assert_eq!(FunctionError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            FunctionError::NotFound("x".into()).to_string(),
            "Function 'x' not found"
        );
    }

    #[test]
    fn test_auth_admin_rejection_mapping() {
        let dup: FunctionError = AuthAdminError::Rejected {
            status: 422,
            message: "User already registered".to_string(),
        }
        .into();
        assert_eq!(dup.status(), StatusCode::BAD_REQUEST);

        let down: FunctionError = AuthAdminError::Rejected {
            status: 503,
            message: "unavailable".to_string(),
        }
        .into();
        assert_eq!(down.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let unconfigured: FunctionError = AuthAdminError::NotConfigured.into();
        assert_eq!(unconfigured.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_backend_failures_hide_details() {
        let down: FunctionError = AuthAdminError::Rejected {
            status: 503,
            message: "upstream db-7.internal unavailable".to_string(),
        }
        .into();
        assert_eq!(down.to_string(), "Failed to send invitation");

        let email: FunctionError =
            EmailError::ProviderError("SendGrid error 401: bad key SG.abc".to_string()).into();
        assert_eq!(email.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(email.to_string(), "Failed to send notification");
    }

    #[test]
    fn test_parse_rejects_bad_bodies() {
        assert!(matches!(
            parse::<SendNotificationRequest>(b""),
            Err(FunctionError::BadRequest(_))
        ));
        assert!(matches!(
            parse::<SendNotificationRequest>(b"{not json"),
            Err(FunctionError::BadRequest(msg)) if msg.starts_with("Invalid JSON")
        ));
    }
}

//! Session introspection and the impersonation / test-mode overlay.
//!
//! The server never stores overlay state. It hands the encoded overlay to
//! the admin client, which sends it back in `X-Impersonation`; dropping the
//! header ends the overlay.

use axum::{extract::State, Json};
use domain::models::{AlertType, NewSecurityAlert, Profile};
use domain::services::{Overlay, SessionInfo};
use persistence::repositories::ProfileRepository;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::roles::BaseRole;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::routes::record_alert;

#[derive(Debug, Deserialize)]
pub struct ImpersonateRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ImpersonateResponse {
    pub overlay: String,
    pub profile: Profile,
}

#[derive(Debug, Deserialize)]
pub struct TestModeRequest {
    pub role: BaseRole,
}

#[derive(Debug, Serialize)]
pub struct TestModeResponse {
    pub overlay: String,
}

/// GET /api/v1/session
///
/// Available to inactive accounts so the portal can show why access stops.
pub async fn get_session(user: CurrentUser) -> Json<SessionInfo> {
    Json(user.session_info())
}

/// POST /api/v1/admin/impersonation
pub async fn start_impersonation(
    State(state): State<AppState>,
    admin: CurrentUser,
    Json(request): Json<ImpersonateRequest>,
) -> Result<Json<ImpersonateResponse>, ApiError> {
    if request.user_id == admin.real.user_id {
        return Err(ApiError::Validation("You cannot impersonate yourself".to_string()));
    }

    let profile: Profile = ProfileRepository::new(state.pool.clone())
        .find_by_id(request.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?
        .into();

    let overlay = Overlay::impersonate(profile.id, profile.role, profile.email.clone()).encode()?;

    record_alert(
        &state,
        NewSecurityAlert::new(
            AlertType::ImpersonationStarted,
            Some(admin.real.user_id),
            format!("Impersonation of {} started", profile.email),
        )
        .with_metadata(json!({
            "target_user_id": profile.id,
            "target_role": profile.role.to_string(),
        })),
    )
    .await;

    info!(
        admin_id = %admin.real.user_id,
        target_id = %profile.id,
        "Impersonation started"
    );
    Ok(Json(ImpersonateResponse { overlay, profile }))
}

/// POST /api/v1/admin/test-mode
pub async fn start_test_mode(
    admin: CurrentUser,
    Json(request): Json<TestModeRequest>,
) -> Result<Json<TestModeResponse>, ApiError> {
    let overlay = Overlay::test_mode(request.role).encode()?;
    info!(admin_id = %admin.real.user_id, role = %request.role, "Test mode started");
    Ok(Json(TestModeResponse { overlay }))
}

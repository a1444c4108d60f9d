//! Administrative profile management.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::profile::{RoleChangeResponse, SetRoleRequest};
use domain::models::{AlertType, NewSecurityAlert, Profile};
use domain::services::{SearchParams, SearchQuery};
use persistence::entities::ProfileEntity;
use persistence::repositories::ProfileRepository;
use serde_json::json;
use shared::pagination::{Page, PageParams};
use shared::roles::UserRole;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::routes::record_alert;

/// GET /api/v1/admin/profiles?cursor=&limit=
pub async fn list_profiles(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Profile>>, ApiError> {
    let limit = params.limit();
    let rows = ProfileRepository::new(state.pool.clone())
        .list_page(params.decoded_cursor()?, limit)
        .await?;

    let page = Page::from_probe(rows, limit, |p: &ProfileEntity| (p.created_at, p.id));
    Ok(Json(page.map(Into::into)))
}

/// GET /api/v1/admin/profiles/search?q=
///
/// Queries shorter than `search.min_chars` return an empty list without
/// touching the database.
pub async fn search_profiles(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let query = SearchQuery::from_params(
        &params,
        state.config.search.min_chars,
        state.config.search.max_limit,
    );
    if !query.is_active() {
        return Ok(Json(Vec::new()));
    }

    let rows = ProfileRepository::new(state.pool.clone())
        .search(&query.contains_pattern(), query.limit())
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

async fn change_role(
    state: &AppState,
    admin: &CurrentUser,
    id: Uuid,
    change: impl FnOnce(UserRole) -> UserRole,
    alert_type: AlertType,
) -> Result<RoleChangeResponse, ApiError> {
    let repo = ProfileRepository::new(state.pool.clone());
    let current = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let previous_role = current.user_role();
    let role = change(previous_role);

    let updated = repo
        .set_role(id, &current.role, &role.to_string())
        .await?
        .ok_or_else(|| ApiError::Conflict("Profile was modified concurrently".to_string()))?;

    record_alert(
        state,
        NewSecurityAlert::new(
            alert_type,
            Some(id),
            format!("Role of {} changed from {} to {}", updated.email, previous_role, role),
        )
        .with_metadata(json!({
            "changed_by": admin.real.user_id,
            "previous_role": previous_role.to_string(),
            "role": role.to_string(),
        })),
    )
    .await;

    info!(
        profile_id = %id,
        changed_by = %admin.real.user_id,
        previous_role = %previous_role,
        role = %role,
        "Profile role changed"
    );

    Ok(RoleChangeResponse {
        id,
        previous_role,
        role,
        active: role.active,
    })
}

/// POST /api/v1/admin/profiles/:id/toggle-active
pub async fn toggle_active(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RoleChangeResponse>, ApiError> {
    if id == admin.real.user_id {
        return Err(ApiError::Validation(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    let response = change_role(
        &state,
        &admin,
        id,
        UserRole::toggle_active,
        AlertType::AccountStatusChanged,
    )
    .await?;
    Ok(Json(response))
}

/// PUT /api/v1/admin/profiles/:id/role
///
/// Changes the base role; the inactive and test flags are kept.
pub async fn set_role(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SetRoleRequest>,
) -> Result<Json<RoleChangeResponse>, ApiError> {
    let response = change_role(
        &state,
        &admin,
        id,
        |role| role.with_base(request.role),
        AlertType::RoleChanged,
    )
    .await?;
    Ok(Json(response))
}

//! Security alert review. Admin only.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::security_alert::SecurityAlertFilter;
use domain::models::SecurityAlert;
use persistence::repositories::SecurityAlertRepository;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

/// GET /api/v1/admin/security-alerts?unresolved=true
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(filter): Query<SecurityAlertFilter>,
) -> Result<Json<Vec<SecurityAlert>>, ApiError> {
    let rows = SecurityAlertRepository::new(state.pool.clone())
        .list(filter.unresolved.unwrap_or(false))
        .await?;
    // Rows with an unknown alert type are skipped
    Ok(Json(rows.into_iter().filter_map(|r| r.into_domain()).collect()))
}

/// POST /api/v1/admin/security-alerts/:id/resolve
pub async fn resolve_alert(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SecurityAlert>, ApiError> {
    let entity = SecurityAlertRepository::new(state.pool.clone())
        .resolve(id, admin.real.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Unresolved alert not found".to_string()))?;

    info!(alert_id = %id, resolved_by = %admin.real.user_id, "Security alert resolved");
    entity
        .into_domain()
        .map(Json)
        .ok_or_else(|| ApiError::Internal(format!("Alert {} has an unknown type", id)))
}

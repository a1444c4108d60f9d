//! Estimate endpoint handlers.
//!
//! Totals are always recomputed here from the line items; clients never
//! send them.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::estimate::{CreateEstimateRequest, UpdateEstimateRequest};
use domain::models::{Estimate, EstimateStatus, LineItem};
use domain::services::billing::{validate_lines, validate_tax_rate};
use domain::services::{compute_totals, Totals};
use persistence::repositories::{EstimateContent, EstimateRepository, NewEstimate, WorkOrderRepository};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::routes::vehicles::load_visible;

/// Validated, priced line items.
fn price(lines: &[LineItem], tax_rate: Decimal) -> Result<(serde_json::Value, Totals), ApiError> {
    validate_tax_rate(tax_rate)?;
    validate_lines(lines)?;
    let json = serde_json::to_value(lines)
        .map_err(|e| ApiError::Internal(format!("Failed to encode line items: {}", e)))?;
    Ok((json, compute_totals(lines, tax_rate)))
}

pub(crate) async fn load_estimate(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
) -> Result<Estimate, ApiError> {
    let estimate: Estimate = EstimateRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Estimate not found".to_string()))?
        .into();
    user.ensure_owns(estimate.customer_id, "Estimate")?;
    Ok(estimate)
}

/// GET /api/v1/estimates
pub async fn list_estimates(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Estimate>>, ApiError> {
    let rows = EstimateRepository::new(state.pool.clone())
        .list(user.owner_scope())
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/estimates/:id
pub async fn get_estimate(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Estimate>, ApiError> {
    Ok(Json(load_estimate(&state, &user, id).await?))
}

/// POST /api/v1/estimates
pub async fn create_estimate(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateEstimateRequest>,
) -> Result<(StatusCode, Json<Estimate>), ApiError> {
    user.require_staff()?;
    request.validate()?;
    let (line_items, totals) = price(&request.line_items, request.tax_rate)?;

    let vehicle = load_visible(&state, &user, request.vehicle_id).await?;
    if let Some(work_order_id) = request.work_order_id {
        let order = WorkOrderRepository::new(state.pool.clone())
            .find_by_id(work_order_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Work order not found".to_string()))?;
        if order.vehicle_id != vehicle.id {
            return Err(ApiError::Validation(
                "Work order belongs to a different vehicle".to_string(),
            ));
        }
    }

    let entity = EstimateRepository::new(state.pool.clone())
        .create(NewEstimate {
            vehicle_id: vehicle.id,
            customer_id: vehicle.owner_id,
            work_order_id: request.work_order_id,
            line_items,
            subtotal: totals.subtotal,
            tax_rate: request.tax_rate,
            tax_amount: totals.tax_amount,
            total: totals.total,
            notes: request.notes.as_deref(),
            valid_until: request.valid_until,
            created_by: user.real.user_id,
        })
        .await?;

    info!(
        estimate_id = %entity.id,
        vehicle_id = %vehicle.id,
        total = %totals.total,
        "Estimate created"
    );
    Ok((StatusCode::CREATED, Json(entity.into())))
}

/// PATCH /api/v1/estimates/:id
///
/// Only drafts can change.
pub async fn update_estimate(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateEstimateRequest>,
) -> Result<Json<Estimate>, ApiError> {
    user.require_staff()?;
    request.validate()?;

    let current = load_estimate(&state, &user, id).await?;
    if !current.status.is_editable() {
        return Err(ApiError::Conflict(format!(
            "Estimate is {} and can no longer be edited",
            current.status
        )));
    }

    let lines = request.line_items.as_ref().unwrap_or(&current.line_items);
    let tax_rate = request.tax_rate.unwrap_or(current.tax_rate);
    let (line_items, totals) = price(lines, tax_rate)?;

    let entity = EstimateRepository::new(state.pool.clone())
        .update_draft(
            id,
            EstimateContent {
                line_items,
                subtotal: totals.subtotal,
                tax_rate,
                tax_amount: totals.tax_amount,
                total: totals.total,
                notes: request.notes.as_deref().or(current.notes.as_deref()),
                valid_until: request.valid_until.or(current.valid_until),
            },
        )
        .await?
        .ok_or_else(|| ApiError::Conflict("Estimate was sent concurrently".to_string()))?;

    info!(estimate_id = %id, total = %totals.total, "Estimate updated");
    Ok(Json(entity.into()))
}

async fn transition(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
    allowed_from: fn(&EstimateStatus) -> bool,
    to: EstimateStatus,
) -> Result<Estimate, ApiError> {
    let current = load_estimate(state, user, id).await?;
    if !allowed_from(&current.status) {
        return Err(ApiError::Conflict(format!(
            "Cannot move estimate from {} to {}",
            current.status, to
        )));
    }

    let entity = EstimateRepository::new(state.pool.clone())
        .transition(id, current.status.as_str(), to.as_str())
        .await?
        .ok_or_else(|| ApiError::Conflict("Estimate status changed concurrently".to_string()))?;

    info!(
        estimate_id = %id,
        from = %current.status,
        to = %to,
        by = %user.real.user_id,
        "Estimate status changed"
    );
    Ok(entity.into())
}

/// POST /api/v1/estimates/:id/send
pub async fn send_estimate(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Estimate>, ApiError> {
    user.require_staff()?;
    let estimate = transition(&state, &user, id, EstimateStatus::is_editable, EstimateStatus::Sent).await?;
    Ok(Json(estimate))
}

/// POST /api/v1/estimates/:id/approve
pub async fn approve_estimate(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Estimate>, ApiError> {
    let estimate = transition(
        &state,
        &user,
        id,
        EstimateStatus::awaits_customer,
        EstimateStatus::Approved,
    )
    .await?;
    Ok(Json(estimate))
}

/// POST /api/v1/estimates/:id/decline
pub async fn decline_estimate(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Estimate>, ApiError> {
    let estimate = transition(
        &state,
        &user,
        id,
        EstimateStatus::awaits_customer,
        EstimateStatus::Declined,
    )
    .await?;
    Ok(Json(estimate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::LineItemKind;

    fn line(quantity: i64, cents: i64) -> LineItem {
        LineItem {
            kind: LineItemKind::Labor,
            description: "Diagnostics".to_string(),
            quantity: Decimal::from(quantity),
            unit_price: Decimal::new(cents, 2),
            inventory_id: None,
        }
    }

    #[test]
    fn test_price_computes_totals() {
        let (json, totals) = price(&[line(2, 4999)], Decimal::new(5, 2)).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(1));
        assert_eq!(totals.subtotal, Decimal::new(9998, 2));
        assert_eq!(totals.tax_amount, Decimal::new(500, 2));
        assert_eq!(totals.total, Decimal::new(10498, 2));
    }

    #[test]
    fn test_price_rejects_bad_input() {
        assert!(matches!(
            price(&[line(1, 100)], Decimal::ONE),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            price(&[line(1, -100)], Decimal::ZERO),
            Err(ApiError::Validation(_))
        ));
    }
}

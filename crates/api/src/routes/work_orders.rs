//! Work order endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::work_order::{
    CreateWorkOrderRequest, UpdateWorkOrderRequest, UpdateWorkOrderStatusRequest, WorkOrderFilter,
};
use domain::models::WorkOrder;
use domain::services::billing::validate_non_negative;
use persistence::repositories::{NewWorkOrder, WorkOrderChanges, WorkOrderRepository};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::routes::vehicles::load_visible;

async fn load_order(state: &AppState, user: &CurrentUser, id: Uuid) -> Result<WorkOrder, ApiError> {
    let order: WorkOrder = WorkOrderRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Work order not found".to_string()))?
        .into();
    user.ensure_owns(order.customer_id, "Work order")?;
    Ok(order)
}

/// GET /api/v1/work-orders?status=&vehicle_id=
///
/// Customers see orders on their own vehicles.
pub async fn list_work_orders(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<WorkOrderFilter>,
) -> Result<Json<Vec<WorkOrder>>, ApiError> {
    let rows = WorkOrderRepository::new(state.pool.clone())
        .list(
            user.owner_scope(),
            filter.status.as_ref().map(|s| s.as_str()),
            filter.vehicle_id,
        )
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/work-orders/:id
pub async fn get_work_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkOrder>, ApiError> {
    Ok(Json(load_order(&state, &user, id).await?))
}

/// POST /api/v1/work-orders
pub async fn create_work_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateWorkOrderRequest>,
) -> Result<(StatusCode, Json<WorkOrder>), ApiError> {
    user.require_staff()?;
    request.validate()?;
    let labor_rate = request.labor_rate.unwrap_or(Decimal::ZERO);
    validate_non_negative(&[("labor_rate", labor_rate)])?;

    let vehicle = load_visible(&state, &user, request.vehicle_id).await?;

    let entity = WorkOrderRepository::new(state.pool.clone())
        .create(NewWorkOrder {
            vehicle_id: vehicle.id,
            customer_id: vehicle.owner_id,
            assigned_to: request.assigned_to,
            description: request.description.trim(),
            diagnosis: request.diagnosis.as_deref(),
            labor_rate,
            mileage_in: request.mileage_in,
        })
        .await?;

    info!(
        work_order_id = %entity.id,
        vehicle_id = %vehicle.id,
        created_by = %user.real.user_id,
        "Work order opened"
    );
    Ok((StatusCode::CREATED, Json(entity.into())))
}

/// PATCH /api/v1/work-orders/:id
///
/// Completed and cancelled orders are read-only.
pub async fn update_work_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWorkOrderRequest>,
) -> Result<Json<WorkOrder>, ApiError> {
    user.require_staff()?;
    request.validate()?;
    let money: Vec<(&'static str, Decimal)> = [
        ("labor_hours", request.labor_hours),
        ("labor_rate", request.labor_rate),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.map(|v| (name, v)))
    .collect();
    validate_non_negative(&money)?;

    let order = load_order(&state, &user, id).await?;
    if order.status.is_terminal() {
        return Err(ApiError::Conflict(format!(
            "Work order is {} and can no longer be edited",
            order.status
        )));
    }

    let entity = WorkOrderRepository::new(state.pool.clone())
        .update(
            id,
            WorkOrderChanges {
                assigned_to: request.assigned_to,
                description: request.description.as_deref().map(str::trim),
                diagnosis: request.diagnosis.as_deref(),
                labor_hours: request.labor_hours,
                labor_rate: request.labor_rate,
            },
        )
        .await?
        .ok_or_else(|| ApiError::Conflict("Work order was closed concurrently".to_string()))?;

    info!(work_order_id = %id, updated_by = %user.real.user_id, "Work order updated");
    Ok(Json(entity.into()))
}

/// POST /api/v1/work-orders/:id/status
pub async fn update_work_order_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWorkOrderStatusRequest>,
) -> Result<Json<WorkOrder>, ApiError> {
    user.require_staff()?;

    let order = load_order(&state, &user, id).await?;
    let next = request.status;
    if !order.status.can_transition_to(next) {
        return Err(ApiError::Conflict(format!(
            "Cannot move work order from {} to {}",
            order.status, next
        )));
    }

    let entity = WorkOrderRepository::new(state.pool.clone())
        .transition(id, order.status.as_str(), next.as_str())
        .await?
        .ok_or_else(|| ApiError::Conflict("Work order status changed concurrently".to_string()))?;

    info!(
        work_order_id = %id,
        from = %order.status,
        to = %next,
        changed_by = %user.real.user_id,
        "Work order status changed"
    );
    Ok(Json(entity.into()))
}

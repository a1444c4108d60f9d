//! Parts inventory endpoint handlers. Staff side only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::inventory::{
    AdjustStockRequest, CreateInventoryItemRequest, UpdateInventoryItemRequest,
};
use domain::models::InventoryItem;
use domain::services::billing::validate_non_negative;
use domain::services::{SearchParams, SearchQuery};
use persistence::repositories::{InventoryChanges, InventoryRepository, NewInventoryItem};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

const DEFAULT_REORDER_LEVEL: i32 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct InventoryFilter {
    pub category: Option<String>,
}

/// GET /api/v1/inventory?category=
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(filter): Query<InventoryFilter>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let rows = InventoryRepository::new(state.pool.clone())
        .list(filter.category.as_deref())
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/inventory/low-stock
pub async fn low_stock(State(state): State<AppState>) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let rows = InventoryRepository::new(state.pool.clone())
        .list_low_stock()
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/inventory/search?q=
pub async fn search_inventory(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let query = SearchQuery::from_params(
        &params,
        state.config.search.min_chars,
        state.config.search.max_limit,
    );
    if !query.is_active() {
        return Ok(Json(Vec::new()));
    }

    let rows = InventoryRepository::new(state.pool.clone())
        .search(&query.contains_pattern(), query.limit())
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/inventory/:id
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InventoryItem>, ApiError> {
    let entity = InventoryRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Inventory item not found".to_string()))?;
    Ok(Json(entity.into()))
}

/// POST /api/v1/inventory
pub async fn create_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateInventoryItemRequest>,
) -> Result<(StatusCode, Json<InventoryItem>), ApiError> {
    request.validate()?;
    validate_non_negative(&request.money_fields())?;

    let part_number = request.part_number.trim().to_uppercase();
    let entity = InventoryRepository::new(state.pool.clone())
        .create(NewInventoryItem {
            part_number: &part_number,
            name: request.name.trim(),
            description: request.description.as_deref(),
            category: request.category.as_deref(),
            quantity: request.quantity,
            reorder_level: request.reorder_level.unwrap_or(DEFAULT_REORDER_LEVEL),
            unit_cost: request.unit_cost,
            retail_price: request.retail_price,
            core_charge: request.core_charge.unwrap_or(Decimal::ZERO),
            location: request.location.as_deref(),
            supplier: request.supplier.as_deref(),
        })
        .await?;

    info!(
        item_id = %entity.id,
        part_number = %entity.part_number,
        created_by = %user.real.user_id,
        "Inventory item created"
    );
    Ok((StatusCode::CREATED, Json(entity.into())))
}

/// PATCH /api/v1/inventory/:id
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateInventoryItemRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    request.validate()?;
    validate_non_negative(&request.money_fields())?;

    let entity = InventoryRepository::new(state.pool.clone())
        .update(
            id,
            InventoryChanges {
                name: request.name.as_deref().map(str::trim),
                description: request.description.as_deref(),
                category: request.category.as_deref(),
                reorder_level: request.reorder_level,
                unit_cost: request.unit_cost,
                retail_price: request.retail_price,
                core_charge: request.core_charge,
                location: request.location.as_deref(),
                supplier: request.supplier.as_deref(),
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Inventory item not found".to_string()))?;

    info!(item_id = %id, "Inventory item updated");
    Ok(Json(entity.into()))
}

/// DELETE /api/v1/inventory/:id
pub async fn delete_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = InventoryRepository::new(state.pool.clone()).delete(id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Inventory item not found".to_string()));
    }

    info!(item_id = %id, deleted_by = %user.real.user_id, "Inventory item deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/inventory/:id/adjust
///
/// Stock may never go below zero.
pub async fn adjust_stock(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AdjustStockRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    request.validate()?;
    if request.delta == 0 {
        return Err(ApiError::Validation("delta must not be zero".to_string()));
    }

    let repo = InventoryRepository::new(state.pool.clone());
    let current = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Inventory item not found".to_string()))?;

    if current.quantity.checked_add(request.delta).map_or(true, |q| q < 0) {
        return Err(ApiError::Conflict(format!(
            "Adjustment of {} would leave {} below zero (on hand: {})",
            request.delta, current.part_number, current.quantity
        )));
    }

    let entity = repo
        .adjust_quantity(id, request.delta)
        .await?
        .ok_or_else(|| ApiError::Conflict("Stock changed concurrently; retry".to_string()))?;

    if entity.quantity <= entity.reorder_level {
        warn!(
            item_id = %id,
            part_number = %entity.part_number,
            quantity = entity.quantity,
            reorder_level = entity.reorder_level,
            "Part at or below reorder level"
        );
    }
    info!(
        item_id = %id,
        delta = request.delta,
        reason = %request.reason,
        adjusted_by = %user.real.user_id,
        "Stock adjusted"
    );
    Ok(Json(entity.into()))
}

//! Counter sales of parts. Staff side only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::inventory::CreatePartSaleRequest;
use domain::models::PartSale;
use domain::services::billing::validate_tax_rate;
use persistence::repositories::PartSaleRepository;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::middleware::metrics::record_part_sale;

/// POST /api/v1/part-sales
///
/// Stock is checked and decremented in the same transaction as the sale.
pub async fn create_part_sale(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreatePartSaleRequest>,
) -> Result<(StatusCode, Json<PartSale>), ApiError> {
    request.validate()?;
    validate_tax_rate(request.tax_rate)?;

    let entity = PartSaleRepository::new(state.pool.clone())
        .create_sale(
            request.customer_id,
            &request.items,
            request.tax_rate,
            user.real.user_id,
        )
        .await?;

    let units: i64 = request.items.iter().map(|l| l.quantity as i64).sum();
    record_part_sale(units);
    info!(
        sale_id = %entity.id,
        lines = request.items.len(),
        units,
        total = %entity.total,
        sold_by = %user.real.user_id,
        "Part sale recorded"
    );
    Ok((StatusCode::CREATED, Json(entity.into())))
}

/// GET /api/v1/part-sales/:id
pub async fn get_part_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PartSale>, ApiError> {
    let entity = PartSaleRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Part sale not found".to_string()))?;
    Ok(Json(entity.into()))
}

//! Core refunds: quotes and recorded returns. Staff side only.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::core_return::{
    CoreRefundQuote, CoreRefundQuoteRequest, CreateCoreReturnRequest,
};
use domain::models::CoreReturn;
use domain::services::{refund_amount, CoreCondition};
use persistence::repositories::{CoreReturnRepository, InventoryRepository};
use rust_decimal::Decimal;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

const CORE_RETURN_LIST_LIMIT: i64 = 200;

/// Refund quote for a charge and condition.
pub fn quote(core_charge: Decimal, condition: CoreCondition) -> Result<CoreRefundQuote, ApiError> {
    Ok(CoreRefundQuote {
        core_charge,
        condition,
        refund_percentage: condition.refund_percentage(),
        refund_amount: refund_amount(core_charge, condition)?,
    })
}

/// POST /api/v1/core-refunds/quote
///
/// Pure calculation; nothing is stored.
pub async fn quote_refund(
    Json(request): Json<CoreRefundQuoteRequest>,
) -> Result<Json<CoreRefundQuote>, ApiError> {
    Ok(Json(quote(request.core_charge, request.condition)?))
}

/// POST /api/v1/core-returns
pub async fn create_core_return(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateCoreReturnRequest>,
) -> Result<(StatusCode, Json<CoreReturn>), ApiError> {
    let item = InventoryRepository::new(state.pool.clone())
        .find_by_id(request.inventory_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Inventory item not found".to_string()))?;

    if item.core_charge <= Decimal::ZERO {
        return Err(ApiError::Validation(format!(
            "{} carries no core charge",
            item.part_number
        )));
    }

    let refund = refund_amount(item.core_charge, request.condition)?;
    let entity = CoreReturnRepository::new(state.pool.clone())
        .create(
            item.id,
            request.part_sale_id,
            request.condition.as_str(),
            item.core_charge,
            refund,
            user.real.user_id,
        )
        .await?;

    info!(
        core_return_id = %entity.id,
        part_number = %item.part_number,
        condition = request.condition.as_str(),
        refund = %refund,
        processed_by = %user.real.user_id,
        "Core return recorded"
    );
    Ok((StatusCode::CREATED, Json(entity.into())))
}

/// GET /api/v1/core-returns
pub async fn list_core_returns(
    State(state): State<AppState>,
) -> Result<Json<Vec<CoreReturn>>, ApiError> {
    let rows = CoreReturnRepository::new(state.pool.clone())
        .list(CORE_RETURN_LIST_LIMIT)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_percentages() {
        let charge = Decimal::new(4000, 2);
        let cases = [
            (CoreCondition::New, 100, Decimal::new(4000, 2)),
            (CoreCondition::Used, 75, Decimal::new(3000, 2)),
            (CoreCondition::Damaged, 25, Decimal::new(1000, 2)),
        ];
        for (condition, pct, amount) in cases {
            let q = quote(charge, condition).unwrap();
            assert_eq!(q.refund_percentage, pct);
            assert_eq!(q.refund_amount, amount);
        }
    }

    #[test]
    fn test_quote_rejects_negative_charge() {
        assert!(matches!(
            quote(Decimal::new(-1, 0), CoreCondition::New),
            Err(ApiError::Validation(_))
        ));
    }
}

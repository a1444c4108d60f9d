//! Core return domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::core_refund::CoreCondition;

/// A returned core and the refund paid for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CoreReturn {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub part_sale_id: Option<Uuid>,
    pub condition: CoreCondition,
    pub core_charge: Decimal,
    pub refund_amount: Decimal,
    pub processed_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Request payload for a refund quote.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CoreRefundQuoteRequest {
    pub core_charge: Decimal,
    pub condition: CoreCondition,
}

/// Response for a refund quote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CoreRefundQuote {
    pub core_charge: Decimal,
    pub condition: CoreCondition,
    pub refund_percentage: u32,
    pub refund_amount: Decimal,
}

/// Request payload for recording a returned core.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateCoreReturnRequest {
    pub inventory_id: Uuid,
    pub part_sale_id: Option<Uuid>,
    pub condition: CoreCondition,
}

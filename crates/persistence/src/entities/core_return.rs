//! Core return entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::services::core_refund::CoreCondition;
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the core_returns table.
#[derive(Debug, Clone, FromRow)]
pub struct CoreReturnEntity {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub part_sale_id: Option<Uuid>,
    pub condition: String,
    pub core_charge: Decimal,
    pub refund_amount: Decimal,
    pub processed_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<CoreReturnEntity> for domain::models::CoreReturn {
    fn from(entity: CoreReturnEntity) -> Self {
        let condition = entity
            .condition
            .parse::<CoreCondition>()
            .unwrap_or(CoreCondition::Damaged);

        Self {
            id: entity.id,
            inventory_id: entity.inventory_id,
            part_sale_id: entity.part_sale_id,
            condition,
            core_charge: entity.core_charge,
            refund_amount: entity.refund_amount,
            processed_by: entity.processed_by,
            created_at: entity.created_at,
        }
    }
}

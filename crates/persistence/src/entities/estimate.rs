//! Estimate entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::estimate::EstimateStatus;
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the estimates table.
#[derive(Debug, Clone, FromRow)]
pub struct EstimateEntity {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub customer_id: Uuid,
    pub work_order_id: Option<Uuid>,
    pub status: String,
    pub line_items: serde_json::Value,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub valid_until: Option<NaiveDate>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EstimateEntity> for domain::models::Estimate {
    fn from(entity: EstimateEntity) -> Self {
        let status = entity
            .status
            .parse::<EstimateStatus>()
            .unwrap_or(EstimateStatus::Draft);
        let line_items = serde_json::from_value(entity.line_items).unwrap_or_default();

        Self {
            id: entity.id,
            vehicle_id: entity.vehicle_id,
            customer_id: entity.customer_id,
            work_order_id: entity.work_order_id,
            status,
            line_items,
            subtotal: entity.subtotal,
            tax_rate: entity.tax_rate,
            tax_amount: entity.tax_amount,
            total: entity.total,
            notes: entity.notes,
            valid_until: entity.valid_until,
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::estimate::LineItemKind;

    #[test]
    fn test_line_items_decoded_from_jsonb() {
        let now = Utc::now();
        let entity = EstimateEntity {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            work_order_id: None,
            status: "sent".to_string(),
            line_items: serde_json::json!([
                {"kind": "labor", "description": "Diagnose noise", "quantity": "1.5", "unit_price": "95.00"}
            ]),
            subtotal: Decimal::new(14250, 2),
            tax_rate: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total: Decimal::new(14250, 2),
            notes: None,
            valid_until: None,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        };

        let estimate: domain::models::Estimate = entity.into();
        assert_eq!(estimate.status, EstimateStatus::Sent);
        assert_eq!(estimate.line_items.len(), 1);
        assert_eq!(estimate.line_items[0].kind, LineItemKind::Labor);
        assert_eq!(estimate.line_items[0].quantity, Decimal::new(15, 1));
    }
}

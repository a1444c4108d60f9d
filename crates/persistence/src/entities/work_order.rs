//! Work order entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::work_order::WorkOrderStatus;
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the work_orders table.
#[derive(Debug, Clone, FromRow)]
pub struct WorkOrderEntity {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub customer_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub status: String,
    pub description: String,
    pub diagnosis: Option<String>,
    pub labor_hours: Decimal,
    pub labor_rate: Decimal,
    pub mileage_in: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<WorkOrderEntity> for domain::models::WorkOrder {
    fn from(entity: WorkOrderEntity) -> Self {
        let status = entity
            .status
            .parse::<WorkOrderStatus>()
            .unwrap_or(WorkOrderStatus::Pending);

        Self {
            id: entity.id,
            vehicle_id: entity.vehicle_id,
            customer_id: entity.customer_id,
            assigned_to: entity.assigned_to,
            status,
            description: entity.description,
            diagnosis: entity.diagnosis,
            labor_hours: entity.labor_hours,
            labor_rate: entity.labor_rate,
            mileage_in: entity.mileage_in,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            completed_at: entity.completed_at,
        }
    }
}

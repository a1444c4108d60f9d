//! Invoice entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::invoice::InvoiceStatus;
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the invoices table.
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceEntity {
    pub id: Uuid,
    pub invoice_number: String,
    pub estimate_id: Option<Uuid>,
    pub work_order_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub status: String,
    pub line_items: serde_json::Value,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InvoiceEntity> for domain::models::Invoice {
    fn from(entity: InvoiceEntity) -> Self {
        let status = entity
            .status
            .parse::<InvoiceStatus>()
            .unwrap_or(InvoiceStatus::Unpaid);
        let line_items = serde_json::from_value(entity.line_items).unwrap_or_default();

        Self {
            id: entity.id,
            invoice_number: entity.invoice_number,
            estimate_id: entity.estimate_id,
            work_order_id: entity.work_order_id,
            customer_id: entity.customer_id,
            vehicle_id: entity.vehicle_id,
            status,
            line_items,
            subtotal: entity.subtotal,
            tax_amount: entity.tax_amount,
            total: entity.total,
            amount_paid: entity.amount_paid,
            due_date: entity.due_date,
            paid_at: entity.paid_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

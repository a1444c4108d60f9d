//! Inventory and part sale entities (database row mappings).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the inventory table.
#[derive(Debug, Clone, FromRow)]
pub struct InventoryEntity {
    pub id: Uuid,
    pub part_number: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub quantity: i32,
    pub reorder_level: i32,
    pub unit_cost: Decimal,
    pub retail_price: Decimal,
    pub core_charge: Decimal,
    pub location: Option<String>,
    pub supplier: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InventoryEntity> for domain::models::InventoryItem {
    fn from(entity: InventoryEntity) -> Self {
        Self {
            id: entity.id,
            part_number: entity.part_number,
            name: entity.name,
            description: entity.description,
            category: entity.category,
            quantity: entity.quantity,
            reorder_level: entity.reorder_level,
            unit_cost: entity.unit_cost,
            retail_price: entity.retail_price,
            core_charge: entity.core_charge,
            location: entity.location,
            supplier: entity.supplier,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the part_sales table.
#[derive(Debug, Clone, FromRow)]
pub struct PartSaleEntity {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub items: serde_json::Value,
    pub subtotal: Decimal,
    pub core_charges: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<PartSaleEntity> for domain::models::PartSale {
    fn from(entity: PartSaleEntity) -> Self {
        Self {
            id: entity.id,
            customer_id: entity.customer_id,
            items: serde_json::from_value(entity.items).unwrap_or_default(),
            subtotal: entity.subtotal,
            core_charges: entity.core_charges,
            tax_amount: entity.tax_amount,
            total: entity.total,
            created_by: entity.created_by,
            created_at: entity.created_at,
        }
    }
}

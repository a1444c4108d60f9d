//! Parts inventory and counter-sale domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A stocked part.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InventoryItem {
    pub id: Uuid,
    pub part_number: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub quantity: i32,
    pub reorder_level: i32,
    pub unit_cost: Decimal,
    pub retail_price: Decimal,
    /// Refundable deposit charged per unit sold; zero when the part has no core.
    pub core_charge: Decimal,
    pub location: Option<String>,
    pub supplier: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_level
    }

    pub fn has_core(&self) -> bool {
        self.core_charge > Decimal::ZERO
    }
}

/// Request payload for adding a part to inventory.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateInventoryItemRequest {
    #[validate(custom(function = "shared::validation::validate_part_number"))]
    pub part_number: String,

    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 60, message = "Category must be at most 60 characters"))]
    pub category: Option<String>,

    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,

    #[validate(range(min = 0, message = "Reorder level cannot be negative"))]
    pub reorder_level: Option<i32>,

    pub unit_cost: Decimal,
    pub retail_price: Decimal,
    pub core_charge: Option<Decimal>,

    #[validate(length(max = 60, message = "Location must be at most 60 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 120, message = "Supplier must be at most 120 characters"))]
    pub supplier: Option<String>,
}

impl CreateInventoryItemRequest {
    /// Money fields that must not be negative, with their names.
    pub fn money_fields(&self) -> Vec<(&'static str, Decimal)> {
        vec![
            ("unit_cost", self.unit_cost),
            ("retail_price", self.retail_price),
            ("core_charge", self.core_charge.unwrap_or_default()),
        ]
    }
}

/// Request payload for updating a part. Quantity changes go through adjustments.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateInventoryItemRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 60, message = "Category must be at most 60 characters"))]
    pub category: Option<String>,

    #[validate(range(min = 0, message = "Reorder level cannot be negative"))]
    pub reorder_level: Option<i32>,

    pub unit_cost: Option<Decimal>,
    pub retail_price: Option<Decimal>,
    pub core_charge: Option<Decimal>,

    #[validate(length(max = 60, message = "Location must be at most 60 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 120, message = "Supplier must be at most 120 characters"))]
    pub supplier: Option<String>,
}

impl UpdateInventoryItemRequest {
    pub fn money_fields(&self) -> Vec<(&'static str, Decimal)> {
        [
            ("unit_cost", self.unit_cost),
            ("retail_price", self.retail_price),
            ("core_charge", self.core_charge),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }
}

/// Request payload for a stock adjustment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdjustStockRequest {
    pub delta: i32,

    #[validate(length(min = 1, max = 200, message = "Reason must be 1-200 characters"))]
    pub reason: String,
}

/// One line of a counter sale.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct PartSaleLine {
    pub inventory_id: Uuid,

    #[validate(range(min = 1, max = 1000, message = "Quantity must be between 1 and 1000"))]
    pub quantity: i32,
}

/// A priced line recorded on a completed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SoldPart {
    pub inventory_id: Uuid,
    pub part_number: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub core_charge: Decimal,
}

/// Request payload for selling parts over the counter.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreatePartSaleRequest {
    pub customer_id: Option<Uuid>,

    #[validate(length(min = 1, max = 50, message = "A sale needs 1-50 lines"))]
    #[validate(nested)]
    pub items: Vec<PartSaleLine>,

    pub tax_rate: Decimal,
}

/// A completed counter sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PartSale {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub items: Vec<SoldPart>,
    pub subtotal: Decimal,
    pub core_charges: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

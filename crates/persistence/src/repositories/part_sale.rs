//! Part sale repository.
//!
//! A sale locks every inventory row it touches, checks stock, decrements it
//! and records the sale in one transaction.

use domain::models::inventory::{PartSaleLine, SoldPart};
use domain::services::billing::{round_money, Totals};
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{InventoryEntity, PartSaleEntity};
use crate::metrics::QueryTimer;
use crate::repositories::inventory::INVENTORY_COLUMNS;

const PART_SALE_COLUMNS: &str =
    "id, customer_id, items, subtotal, core_charges, tax_amount, total, created_by, created_at";

/// Errors from recording a sale.
#[derive(Debug, Error)]
pub enum PartSaleError {
    #[error("Inventory item {0} not found")]
    ItemNotFound(Uuid),

    #[error("Insufficient stock for {part_number}: requested {requested}, available {available}")]
    InsufficientStock {
        part_number: String,
        requested: i32,
        available: i32,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Priced totals of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub totals: Totals,
    pub core_charges: Decimal,
}

/// Prices locked rows. Lines for the same part are merged first.
pub fn price_sale(
    lines: &[(InventoryEntity, i32)],
    tax_rate: Decimal,
) -> (Vec<SoldPart>, SaleTotals) {
    let mut items = Vec::with_capacity(lines.len());
    let mut subtotal = Decimal::ZERO;
    let mut core_charges = Decimal::ZERO;

    for (item, quantity) in lines {
        let qty = Decimal::from(*quantity);
        subtotal += round_money(item.retail_price * qty);
        core_charges += round_money(item.core_charge * qty);
        items.push(SoldPart {
            inventory_id: item.id,
            part_number: item.part_number.clone(),
            name: item.name.clone(),
            quantity: *quantity,
            unit_price: item.retail_price,
            core_charge: item.core_charge,
        });
    }

    // Core deposits are refundable and not taxed.
    let tax_amount = round_money(subtotal * tax_rate);
    let totals = Totals {
        subtotal,
        tax_amount,
        total: subtotal + tax_amount + core_charges,
    };
    (items, SaleTotals { totals, core_charges })
}

/// Merges repeated parts and orders lines by id so concurrent sales lock rows
/// in the same order.
pub fn merge_lines(lines: &[PartSaleLine]) -> Vec<(Uuid, i32)> {
    let mut merged: Vec<(Uuid, i32)> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|(id, _)| *id == line.inventory_id) {
            Some((_, qty)) => *qty += line.quantity,
            None => merged.push((line.inventory_id, line.quantity)),
        }
    }
    merged.sort_by_key(|(id, _)| *id);
    merged
}

/// Repository for counter sales.
#[derive(Clone)]
pub struct PartSaleRepository {
    pool: PgPool,
}

impl PartSaleRepository {
    /// Creates a new PartSaleRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PartSaleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_part_sale_by_id");
        let result = sqlx::query_as::<_, PartSaleEntity>(&format!(
            "SELECT {} FROM part_sales WHERE id = $1",
            PART_SALE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Sell parts: lock rows, check and decrement stock, then record the sale.
    pub async fn create_sale(
        &self,
        customer_id: Option<Uuid>,
        lines: &[PartSaleLine],
        tax_rate: Decimal,
        created_by: Uuid,
    ) -> Result<PartSaleEntity, PartSaleError> {
        let timer = QueryTimer::new("create_part_sale");
        let mut tx = self.pool.begin().await?;

        let mut locked = Vec::new();
        for (inventory_id, quantity) in merge_lines(lines) {
            let item = sqlx::query_as::<_, InventoryEntity>(&format!(
                "SELECT {} FROM inventory WHERE id = $1 FOR UPDATE",
                INVENTORY_COLUMNS
            ))
            .bind(inventory_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(PartSaleError::ItemNotFound(inventory_id))?;

            if item.quantity < quantity {
                return Err(PartSaleError::InsufficientStock {
                    part_number: item.part_number,
                    requested: quantity,
                    available: item.quantity,
                });
            }

            sqlx::query("UPDATE inventory SET quantity = quantity - $2, updated_at = NOW() WHERE id = $1")
                .bind(inventory_id)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;

            locked.push((item, quantity));
        }

        let (items, priced) = price_sale(&locked, tax_rate);
        let items = serde_json::to_value(items)
            .map_err(|e| PartSaleError::Database(sqlx::Error::Decode(Box::new(e))))?;

        let sale = sqlx::query_as::<_, PartSaleEntity>(&format!(
            r#"
            INSERT INTO part_sales
                (customer_id, items, subtotal, core_charges, tax_amount, total, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            PART_SALE_COLUMNS
        ))
        .bind(customer_id)
        .bind(items)
        .bind(priced.totals.subtotal)
        .bind(priced.core_charges)
        .bind(priced.totals.tax_amount)
        .bind(priced.totals.total)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(sale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(retail: Decimal, core: Decimal) -> InventoryEntity {
        let now = Utc::now();
        InventoryEntity {
            id: Uuid::new_v4(),
            part_number: "STR-100".to_string(),
            name: "Starter motor".to_string(),
            description: None,
            category: None,
            quantity: 10,
            reorder_level: 2,
            unit_cost: Decimal::new(6000, 2),
            retail_price: retail,
            core_charge: core,
            location: None,
            supplier: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_price_sale_adds_untaxed_core_charges() {
        let starter = item(Decimal::new(14999, 2), Decimal::new(4000, 2));
        let filter = item(Decimal::new(899, 2), Decimal::ZERO);
        let (items, priced) = price_sale(&[(starter, 1), (filter, 2)], Decimal::new(8, 2));

        assert_eq!(items.len(), 2);
        // 149.99 + 2 x 8.99 = 167.97
        assert_eq!(priced.totals.subtotal, Decimal::new(16797, 2));
        assert_eq!(priced.core_charges, Decimal::new(4000, 2));
        // 167.97 x 0.08 = 13.4376 -> 13.44
        assert_eq!(priced.totals.tax_amount, Decimal::new(1344, 2));
        assert_eq!(priced.totals.total, Decimal::new(22141, 2));
    }

    #[test]
    fn test_merge_lines_combines_and_sorts() {
        let a = Uuid::from_u128(2);
        let b = Uuid::from_u128(1);
        let lines = vec![
            PartSaleLine { inventory_id: a, quantity: 1 },
            PartSaleLine { inventory_id: b, quantity: 3 },
            PartSaleLine { inventory_id: a, quantity: 2 },
        ];
        assert_eq!(merge_lines(&lines), vec![(b, 3), (a, 3)]);
    }
}

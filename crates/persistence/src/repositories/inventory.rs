//! Inventory repository for database operations.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::InventoryEntity;
use crate::metrics::QueryTimer;

pub(crate) const INVENTORY_COLUMNS: &str = "id, part_number, name, description, category, \
     quantity, reorder_level, unit_cost, retail_price, core_charge, location, supplier, \
     created_at, updated_at";

/// Column values for a new inventory item.
#[derive(Debug, Clone)]
pub struct NewInventoryItem<'a> {
    pub part_number: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub quantity: i32,
    pub reorder_level: i32,
    pub unit_cost: Decimal,
    pub retail_price: Decimal,
    pub core_charge: Decimal,
    pub location: Option<&'a str>,
    pub supplier: Option<&'a str>,
}

/// Column changes for an inventory item; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct InventoryChanges<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub reorder_level: Option<i32>,
    pub unit_cost: Option<Decimal>,
    pub retail_price: Option<Decimal>,
    pub core_charge: Option<Decimal>,
    pub location: Option<&'a str>,
    pub supplier: Option<&'a str>,
}

/// Repository for inventory-related database operations.
#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<InventoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_inventory_by_id");
        let result = sqlx::query_as::<_, InventoryEntity>(&format!(
            "SELECT {} FROM inventory WHERE id = $1",
            INVENTORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List items ordered by part number, optionally within one category.
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<InventoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_inventory");
        let result = sqlx::query_as::<_, InventoryEntity>(&format!(
            r#"
            SELECT {}
            FROM inventory
            WHERE ($1::text IS NULL OR category = $1)
            ORDER BY part_number
            LIMIT 1000
            "#,
            INVENTORY_COLUMNS
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Items at or below their reorder level.
    pub async fn list_low_stock(&self) -> Result<Vec<InventoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_low_stock_inventory");
        let result = sqlx::query_as::<_, InventoryEntity>(&format!(
            r#"
            SELECT {}
            FROM inventory
            WHERE quantity <= reorder_level
            ORDER BY quantity - reorder_level, part_number
            "#,
            INVENTORY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Items whose part number, name or category contains the pattern.
    pub async fn search(&self, pattern: &str, limit: i64) -> Result<Vec<InventoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("search_inventory");
        let result = sqlx::query_as::<_, InventoryEntity>(&format!(
            r#"
            SELECT {}
            FROM inventory
            WHERE part_number ILIKE $1 OR name ILIKE $1 OR category ILIKE $1
            ORDER BY part_number
            LIMIT $2
            "#,
            INVENTORY_COLUMNS
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(&self, item: NewInventoryItem<'_>) -> Result<InventoryEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_inventory_item");
        let result = sqlx::query_as::<_, InventoryEntity>(&format!(
            r#"
            INSERT INTO inventory
                (part_number, name, description, category, quantity, reorder_level,
                 unit_cost, retail_price, core_charge, location, supplier)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            INVENTORY_COLUMNS
        ))
        .bind(item.part_number)
        .bind(item.name)
        .bind(item.description)
        .bind(item.category)
        .bind(item.quantity)
        .bind(item.reorder_level)
        .bind(item.unit_cost)
        .bind(item.retail_price)
        .bind(item.core_charge)
        .bind(item.location)
        .bind(item.supplier)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn update(
        &self,
        id: Uuid,
        changes: InventoryChanges<'_>,
    ) -> Result<Option<InventoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_inventory_item");
        let result = sqlx::query_as::<_, InventoryEntity>(&format!(
            r#"
            UPDATE inventory
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                reorder_level = COALESCE($5, reorder_level),
                unit_cost = COALESCE($6, unit_cost),
                retail_price = COALESCE($7, retail_price),
                core_charge = COALESCE($8, core_charge),
                location = COALESCE($9, location),
                supplier = COALESCE($10, supplier),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            INVENTORY_COLUMNS
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.category)
        .bind(changes.reorder_level)
        .bind(changes.unit_cost)
        .bind(changes.retail_price)
        .bind(changes.core_charge)
        .bind(changes.location)
        .bind(changes.supplier)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Apply a stock delta unless it would take the quantity below zero.
    ///
    /// Returns `None` when the item is missing or the delta is too large.
    pub async fn adjust_quantity(
        &self,
        id: Uuid,
        delta: i32,
    ) -> Result<Option<InventoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("adjust_inventory_quantity");
        let result = sqlx::query_as::<_, InventoryEntity>(&format!(
            r#"
            UPDATE inventory
            SET quantity = quantity + $2, updated_at = NOW()
            WHERE id = $1 AND quantity + $2 >= 0
            RETURNING {}
            "#,
            INVENTORY_COLUMNS
        ))
        .bind(id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_inventory_item");
        let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}

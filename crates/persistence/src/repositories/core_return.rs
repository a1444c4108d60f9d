//! Core return repository for database operations.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::CoreReturnEntity;
use crate::metrics::QueryTimer;

const CORE_RETURN_COLUMNS: &str =
    "id, inventory_id, part_sale_id, condition, core_charge, refund_amount, processed_by, created_at";

/// Repository for returned cores.
#[derive(Clone)]
pub struct CoreReturnRepository {
    pool: PgPool,
}

impl CoreReturnRepository {
    /// Creates a new CoreReturnRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        inventory_id: Uuid,
        part_sale_id: Option<Uuid>,
        condition: &str,
        core_charge: Decimal,
        refund_amount: Decimal,
        processed_by: Uuid,
    ) -> Result<CoreReturnEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_core_return");
        let result = sqlx::query_as::<_, CoreReturnEntity>(&format!(
            r#"
            INSERT INTO core_returns
                (inventory_id, part_sale_id, condition, core_charge, refund_amount, processed_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            CORE_RETURN_COLUMNS
        ))
        .bind(inventory_id)
        .bind(part_sale_id)
        .bind(condition)
        .bind(core_charge)
        .bind(refund_amount)
        .bind(processed_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Most recent returns first.
    pub async fn list(&self, limit: i64) -> Result<Vec<CoreReturnEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_core_returns");
        let result = sqlx::query_as::<_, CoreReturnEntity>(&format!(
            "SELECT {} FROM core_returns ORDER BY created_at DESC LIMIT $1",
            CORE_RETURN_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}

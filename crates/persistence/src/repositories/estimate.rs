//! Estimate repository for database operations.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::EstimateEntity;
use crate::metrics::QueryTimer;

const ESTIMATE_COLUMNS: &str = "id, vehicle_id, customer_id, work_order_id, status, line_items, \
     subtotal, tax_rate, tax_amount, total, notes, valid_until, created_by, created_at, updated_at";

/// Column values for a new draft estimate.
#[derive(Debug, Clone)]
pub struct NewEstimate<'a> {
    pub vehicle_id: Uuid,
    pub customer_id: Uuid,
    pub work_order_id: Option<Uuid>,
    pub line_items: serde_json::Value,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub notes: Option<&'a str>,
    pub valid_until: Option<NaiveDate>,
    pub created_by: Uuid,
}

/// Replacement content of a draft estimate.
#[derive(Debug, Clone)]
pub struct EstimateContent<'a> {
    pub line_items: serde_json::Value,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub notes: Option<&'a str>,
    pub valid_until: Option<NaiveDate>,
}

/// Repository for estimate-related database operations.
#[derive(Clone)]
pub struct EstimateRepository {
    pool: PgPool,
}

impl EstimateRepository {
    /// Creates a new EstimateRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<EstimateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_estimate_by_id");
        let result = sqlx::query_as::<_, EstimateEntity>(&format!(
            "SELECT {} FROM estimates WHERE id = $1",
            ESTIMATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List estimates, newest first, optionally for one customer.
    pub async fn list(&self, customer_id: Option<Uuid>) -> Result<Vec<EstimateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_estimates");
        let result = sqlx::query_as::<_, EstimateEntity>(&format!(
            r#"
            SELECT {}
            FROM estimates
            WHERE ($1::uuid IS NULL OR customer_id = $1)
            ORDER BY created_at DESC
            LIMIT 500
            "#,
            ESTIMATE_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(&self, estimate: NewEstimate<'_>) -> Result<EstimateEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_estimate");
        let result = sqlx::query_as::<_, EstimateEntity>(&format!(
            r#"
            INSERT INTO estimates
                (vehicle_id, customer_id, work_order_id, status, line_items, subtotal,
                 tax_rate, tax_amount, total, notes, valid_until, created_by)
            VALUES ($1, $2, $3, 'draft', $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            ESTIMATE_COLUMNS
        ))
        .bind(estimate.vehicle_id)
        .bind(estimate.customer_id)
        .bind(estimate.work_order_id)
        .bind(estimate.line_items)
        .bind(estimate.subtotal)
        .bind(estimate.tax_rate)
        .bind(estimate.tax_amount)
        .bind(estimate.total)
        .bind(estimate.notes)
        .bind(estimate.valid_until)
        .bind(estimate.created_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Replace the content of a draft. Returns `None` if it is no longer a draft.
    pub async fn update_draft(
        &self,
        id: Uuid,
        content: EstimateContent<'_>,
    ) -> Result<Option<EstimateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_estimate_draft");
        let result = sqlx::query_as::<_, EstimateEntity>(&format!(
            r#"
            UPDATE estimates
            SET line_items = $2,
                subtotal = $3,
                tax_rate = $4,
                tax_amount = $5,
                total = $6,
                notes = COALESCE($7, notes),
                valid_until = COALESCE($8, valid_until),
                updated_at = NOW()
            WHERE id = $1 AND status = 'draft'
            RETURNING {}
            "#,
            ESTIMATE_COLUMNS
        ))
        .bind(id)
        .bind(content.line_items)
        .bind(content.subtotal)
        .bind(content.tax_rate)
        .bind(content.tax_amount)
        .bind(content.total)
        .bind(content.notes)
        .bind(content.valid_until)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Move an estimate from `from` to `to`. Returns `None` if it is no longer in `from`.
    pub async fn transition(
        &self,
        id: Uuid,
        from: &str,
        to: &str,
    ) -> Result<Option<EstimateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("transition_estimate");
        let result = sqlx::query_as::<_, EstimateEntity>(&format!(
            r#"
            UPDATE estimates
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            ESTIMATE_COLUMNS
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}

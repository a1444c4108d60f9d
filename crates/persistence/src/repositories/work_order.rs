//! Work order repository for database operations.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::WorkOrderEntity;
use crate::metrics::QueryTimer;

const WORK_ORDER_COLUMNS: &str = "id, vehicle_id, customer_id, assigned_to, status, description, \
     diagnosis, labor_hours, labor_rate, mileage_in, created_at, updated_at, completed_at";

/// Column values for a new work order.
#[derive(Debug, Clone)]
pub struct NewWorkOrder<'a> {
    pub vehicle_id: Uuid,
    pub customer_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub description: &'a str,
    pub diagnosis: Option<&'a str>,
    pub labor_rate: Decimal,
    pub mileage_in: Option<i32>,
}

/// Column changes for a work order; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct WorkOrderChanges<'a> {
    pub assigned_to: Option<Uuid>,
    pub description: Option<&'a str>,
    pub diagnosis: Option<&'a str>,
    pub labor_hours: Option<Decimal>,
    pub labor_rate: Option<Decimal>,
}

/// Repository for work-order-related database operations.
#[derive(Clone)]
pub struct WorkOrderRepository {
    pool: PgPool,
}

impl WorkOrderRepository {
    /// Creates a new WorkOrderRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<WorkOrderEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_work_order_by_id");
        let result = sqlx::query_as::<_, WorkOrderEntity>(&format!(
            "SELECT {} FROM work_orders WHERE id = $1",
            WORK_ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List work orders, newest first, with optional filters.
    pub async fn list(
        &self,
        customer_id: Option<Uuid>,
        status: Option<&str>,
        vehicle_id: Option<Uuid>,
    ) -> Result<Vec<WorkOrderEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_work_orders");
        let result = sqlx::query_as::<_, WorkOrderEntity>(&format!(
            r#"
            SELECT {}
            FROM work_orders
            WHERE ($1::uuid IS NULL OR customer_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR vehicle_id = $3)
            ORDER BY created_at DESC
            LIMIT 500
            "#,
            WORK_ORDER_COLUMNS
        ))
        .bind(customer_id)
        .bind(status)
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(&self, order: NewWorkOrder<'_>) -> Result<WorkOrderEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_work_order");
        let result = sqlx::query_as::<_, WorkOrderEntity>(&format!(
            r#"
            INSERT INTO work_orders
                (vehicle_id, customer_id, assigned_to, status, description, diagnosis,
                 labor_hours, labor_rate, mileage_in)
            VALUES ($1, $2, $3, 'pending', $4, $5, 0, $6, $7)
            RETURNING {}
            "#,
            WORK_ORDER_COLUMNS
        ))
        .bind(order.vehicle_id)
        .bind(order.customer_id)
        .bind(order.assigned_to)
        .bind(order.description)
        .bind(order.diagnosis)
        .bind(order.labor_rate)
        .bind(order.mileage_in)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update details of an order that is not completed or cancelled.
    pub async fn update(
        &self,
        id: Uuid,
        changes: WorkOrderChanges<'_>,
    ) -> Result<Option<WorkOrderEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_work_order");
        let result = sqlx::query_as::<_, WorkOrderEntity>(&format!(
            r#"
            UPDATE work_orders
            SET assigned_to = COALESCE($2, assigned_to),
                description = COALESCE($3, description),
                diagnosis = COALESCE($4, diagnosis),
                labor_hours = COALESCE($5, labor_hours),
                labor_rate = COALESCE($6, labor_rate),
                updated_at = NOW()
            WHERE id = $1 AND status NOT IN ('completed', 'cancelled')
            RETURNING {}
            "#,
            WORK_ORDER_COLUMNS
        ))
        .bind(id)
        .bind(changes.assigned_to)
        .bind(changes.description)
        .bind(changes.diagnosis)
        .bind(changes.labor_hours)
        .bind(changes.labor_rate)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Move an order from `from` to `to`. Completing stamps `completed_at`.
    ///
    /// Returns `None` if the order is no longer in `from`.
    pub async fn transition(
        &self,
        id: Uuid,
        from: &str,
        to: &str,
    ) -> Result<Option<WorkOrderEntity>, sqlx::Error> {
        let timer = QueryTimer::new("transition_work_order");
        let result = sqlx::query_as::<_, WorkOrderEntity>(&format!(
            r#"
            UPDATE work_orders
            SET status = $3,
                completed_at = CASE WHEN $3 = 'completed' THEN NOW() ELSE completed_at END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            WORK_ORDER_COLUMNS
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

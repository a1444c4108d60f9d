//! Invoice repository for database operations.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{EstimateEntity, InvoiceEntity};
use crate::metrics::QueryTimer;

const INVOICE_COLUMNS: &str = "id, invoice_number, estimate_id, work_order_id, customer_id, \
     vehicle_id, status, line_items, subtotal, tax_amount, total, amount_paid, due_date, paid_at, \
     created_at, updated_at";

/// Repository for invoice-related database operations.
#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<InvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invoice_by_id");
        let result = sqlx::query_as::<_, InvoiceEntity>(&format!(
            "SELECT {} FROM invoices WHERE id = $1",
            INVOICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Invoice already issued for an estimate, if any.
    pub async fn find_by_estimate(&self, estimate_id: Uuid) -> Result<Option<InvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invoice_by_estimate");
        let result = sqlx::query_as::<_, InvoiceEntity>(&format!(
            "SELECT {} FROM invoices WHERE estimate_id = $1",
            INVOICE_COLUMNS
        ))
        .bind(estimate_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List invoices, newest first, optionally for one customer.
    pub async fn list(&self, customer_id: Option<Uuid>) -> Result<Vec<InvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_invoices");
        let result = sqlx::query_as::<_, InvoiceEntity>(&format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE ($1::uuid IS NULL OR customer_id = $1)
            ORDER BY created_at DESC
            LIMIT 500
            "#,
            INVOICE_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Issue an unpaid invoice copying an estimate's lines and totals.
    pub async fn create_from_estimate(
        &self,
        invoice_number: &str,
        estimate: &EstimateEntity,
        due_date: Option<NaiveDate>,
    ) -> Result<InvoiceEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_invoice_from_estimate");
        let result = sqlx::query_as::<_, InvoiceEntity>(&format!(
            r#"
            INSERT INTO invoices
                (invoice_number, estimate_id, work_order_id, customer_id, vehicle_id, status,
                 line_items, subtotal, tax_amount, total, amount_paid, due_date)
            VALUES ($1, $2, $3, $4, $5, 'unpaid', $6, $7, $8, $9, 0, $10)
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(invoice_number)
        .bind(estimate.id)
        .bind(estimate.work_order_id)
        .bind(estimate.customer_id)
        .bind(estimate.vehicle_id)
        .bind(&estimate.line_items)
        .bind(estimate.subtotal)
        .bind(estimate.tax_amount)
        .bind(estimate.total)
        .bind(due_date)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Store a payment, guarded on the previously read paid amount.
    ///
    /// Returns `None` if another payment landed in between.
    pub async fn record_payment(
        &self,
        id: Uuid,
        previous_paid: Decimal,
        amount_paid: Decimal,
        status: &str,
    ) -> Result<Option<InvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("record_invoice_payment");
        let result = sqlx::query_as::<_, InvoiceEntity>(&format!(
            r#"
            UPDATE invoices
            SET amount_paid = $3,
                status = $4,
                paid_at = CASE WHEN $4 = 'paid' THEN NOW() ELSE paid_at END,
                updated_at = NOW()
            WHERE id = $1 AND amount_paid = $2 AND status IN ('unpaid', 'partially_paid')
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(id)
        .bind(previous_paid)
        .bind(amount_paid)
        .bind(status)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Void an invoice that has not been fully paid.
    pub async fn void(&self, id: Uuid) -> Result<Option<InvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("void_invoice");
        let result = sqlx::query_as::<_, InvoiceEntity>(&format!(
            r#"
            UPDATE invoices
            SET status = 'void', updated_at = NOW()
            WHERE id = $1 AND status IN ('unpaid', 'partially_paid')
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}

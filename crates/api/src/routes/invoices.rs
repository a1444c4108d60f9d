//! Invoice endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::invoice::{
    format_invoice_number, CreateInvoiceFromEstimateRequest, RecordPaymentRequest,
};
use domain::models::{EstimateStatus, Invoice, InvoiceStatus};
use domain::services::billing::apply_payment;
use persistence::repositories::{EstimateRepository, InvoiceRepository};
use shared::crypto::random_code;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::middleware::metrics::record_invoice_payment;

const INVOICE_SUFFIX_LEN: usize = 6;

async fn load_invoice(state: &AppState, user: &CurrentUser, id: Uuid) -> Result<Invoice, ApiError> {
    let invoice: Invoice = InvoiceRepository::new(state.pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?
        .into();
    user.ensure_owns(invoice.customer_id, "Invoice")?;
    Ok(invoice)
}

/// GET /api/v1/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    let rows = InvoiceRepository::new(state.pool.clone())
        .list(user.owner_scope())
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/invoices/:id
pub async fn get_invoice(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    Ok(Json(load_invoice(&state, &user, id).await?))
}

/// POST /api/v1/invoices/from-estimate/:estimate_id
///
/// Copies the lines and totals of an approved estimate.
pub async fn create_from_estimate(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(estimate_id): Path<Uuid>,
    request: Option<Json<CreateInvoiceFromEstimateRequest>>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    user.require_staff()?;
    let due_date = request.and_then(|Json(r)| r.due_date);

    let estimate = EstimateRepository::new(state.pool.clone())
        .find_by_id(estimate_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Estimate not found".to_string()))?;

    if estimate.status != EstimateStatus::Approved.as_str() {
        return Err(ApiError::Conflict(format!(
            "Estimate is {} and must be approved before invoicing",
            estimate.status
        )));
    }

    let invoices = InvoiceRepository::new(state.pool.clone());
    if let Some(existing) = invoices.find_by_estimate(estimate_id).await? {
        return Err(ApiError::Conflict(format!(
            "Estimate was already invoiced as {}",
            existing.invoice_number
        )));
    }

    let number = format_invoice_number(Utc::now().date_naive(), &random_code(INVOICE_SUFFIX_LEN));
    let entity = invoices
        .create_from_estimate(&number, &estimate, due_date)
        .await?;

    info!(
        invoice_id = %entity.id,
        invoice_number = %entity.invoice_number,
        estimate_id = %estimate_id,
        total = %entity.total,
        "Invoice created"
    );
    Ok((StatusCode::CREATED, Json(entity.into())))
}

/// POST /api/v1/invoices/:id/payments
pub async fn record_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<Invoice>, ApiError> {
    user.require_staff()?;

    let invoice = load_invoice(&state, &user, id).await?;
    let (amount_paid, status) =
        apply_payment(invoice.status, invoice.total, invoice.amount_paid, request.amount)?;

    let entity = InvoiceRepository::new(state.pool.clone())
        .record_payment(id, invoice.amount_paid, amount_paid, status.as_str())
        .await?
        .ok_or_else(|| ApiError::Conflict("Invoice changed concurrently; retry".to_string()))?;

    record_invoice_payment(status == InvoiceStatus::Paid);
    info!(
        invoice_id = %id,
        amount = %request.amount,
        amount_paid = %amount_paid,
        status = %status,
        recorded_by = %user.real.user_id,
        "Payment recorded"
    );
    Ok(Json(entity.into()))
}

/// POST /api/v1/invoices/:id/void
///
/// Only unpaid or partially paid invoices can be voided.
pub async fn void_invoice(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    user.require_staff()?;

    let invoice = load_invoice(&state, &user, id).await?;
    if !invoice.status.accepts_payment() {
        return Err(ApiError::Conflict(format!(
            "Invoice is {} and cannot be voided",
            invoice.status
        )));
    }

    let entity = InvoiceRepository::new(state.pool.clone())
        .void(id)
        .await?
        .ok_or_else(|| ApiError::Conflict("Invoice changed concurrently".to_string()))?;

    info!(invoice_id = %id, voided_by = %user.real.user_id, "Invoice voided");
    Ok(Json(entity.into()))
}

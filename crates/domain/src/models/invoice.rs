//! Invoice domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::estimate::LineItem;

/// Payment status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Void => "void",
        }
    }

    /// Whether the invoice still accepts payments.
    pub fn accepts_payment(&self) -> bool {
        matches!(self, InvoiceStatus::Unpaid | InvoiceStatus::PartiallyPaid)
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(InvoiceStatus::Unpaid),
            "partially_paid" => Ok(InvoiceStatus::PartiallyPaid),
            "paid" => Ok(InvoiceStatus::Paid),
            "void" => Ok(InvoiceStatus::Void),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a customer invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub estimate_id: Option<Uuid>,
    pub work_order_id: Option<Uuid>,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub status: InvoiceStatus,
    pub line_items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn balance_due(&self) -> Decimal {
        (self.total - self.amount_paid).max(Decimal::ZERO)
    }
}

/// Request payload for converting an approved estimate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateInvoiceFromEstimateRequest {
    pub due_date: Option<NaiveDate>,
}

/// Request payload for recording a payment.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
}

/// Builds an invoice number of the form `INV-YYYYMMDD-XXXXXX`.
pub fn format_invoice_number(date: NaiveDate, suffix: &str) -> String {
    format!("INV-{}-{}", date.format("%Y%m%d"), suffix)
}

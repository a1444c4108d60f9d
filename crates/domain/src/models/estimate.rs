//! Estimate domain models and billing line items.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Kind of a billed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineItemKind {
    Labor,
    Part,
    Fee,
}

/// A single line on an estimate or invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct LineItem {
    pub kind: LineItemKind,

    #[validate(length(min = 1, max = 200, message = "Line description must be 1-200 characters"))]
    pub description: String,

    pub quantity: Decimal,
    pub unit_price: Decimal,

    /// Inventory part this line draws from, for `part` lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_id: Option<Uuid>,
}

/// Lifecycle status of an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateStatus {
    Draft,
    Sent,
    Approved,
    Declined,
}

impl EstimateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimateStatus::Draft => "draft",
            EstimateStatus::Sent => "sent",
            EstimateStatus::Approved => "approved",
            EstimateStatus::Declined => "declined",
        }
    }

    /// Only drafts may be edited.
    pub fn is_editable(&self) -> bool {
        matches!(self, EstimateStatus::Draft)
    }

    /// Customers decide only on estimates that were sent to them.
    pub fn awaits_customer(&self) -> bool {
        matches!(self, EstimateStatus::Sent)
    }
}

impl FromStr for EstimateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(EstimateStatus::Draft),
            "sent" => Ok(EstimateStatus::Sent),
            "approved" => Ok(EstimateStatus::Approved),
            "declined" => Ok(EstimateStatus::Declined),
            _ => Err(format!("Invalid estimate status: {}", s)),
        }
    }
}

impl fmt::Display for EstimateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a repair estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Estimate {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub customer_id: Uuid,
    pub work_order_id: Option<Uuid>,
    pub status: EstimateStatus,
    pub line_items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub valid_until: Option<NaiveDate>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating an estimate.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateEstimateRequest {
    pub vehicle_id: Uuid,
    pub work_order_id: Option<Uuid>,

    #[validate(length(min = 1, max = 100, message = "An estimate needs 1-100 line items"))]
    #[validate(nested)]
    pub line_items: Vec<LineItem>,

    /// Fractional rate, e.g. `0.0825` for 8.25%.
    pub tax_rate: Decimal,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,

    pub valid_until: Option<NaiveDate>,
}

/// Request payload for updating a draft estimate.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateEstimateRequest {
    #[validate(length(min = 1, max = 100, message = "An estimate needs 1-100 line items"))]
    #[validate(nested)]
    pub line_items: Option<Vec<LineItem>>,

    pub tax_rate: Option<Decimal>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,

    pub valid_until: Option<NaiveDate>,
}

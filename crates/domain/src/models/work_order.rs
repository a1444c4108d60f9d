//! Work order domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Pending,
    InProgress,
    AwaitingParts,
    Completed,
    Cancelled,
}

impl WorkOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Pending => "pending",
            WorkOrderStatus::InProgress => "in_progress",
            WorkOrderStatus::AwaitingParts => "awaiting_parts",
            WorkOrderStatus::Completed => "completed",
            WorkOrderStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled orders accept no further changes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkOrderStatus::Completed | WorkOrderStatus::Cancelled)
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: WorkOrderStatus) -> bool {
        use WorkOrderStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Cancelled)
                | (InProgress, AwaitingParts)
                | (InProgress, Completed)
                | (InProgress, Cancelled)
                | (AwaitingParts, InProgress)
                | (AwaitingParts, Cancelled)
        )
    }
}

impl FromStr for WorkOrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WorkOrderStatus::Pending),
            "in_progress" => Ok(WorkOrderStatus::InProgress),
            "awaiting_parts" => Ok(WorkOrderStatus::AwaitingParts),
            "completed" => Ok(WorkOrderStatus::Completed),
            "cancelled" => Ok(WorkOrderStatus::Cancelled),
            _ => Err(format!("Invalid work order status: {}", s)),
        }
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a repair work order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkOrder {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub customer_id: Uuid,
    pub assigned_to: Option<Uuid>,
    pub status: WorkOrderStatus,
    pub description: String,
    pub diagnosis: Option<String>,
    pub labor_hours: Decimal,
    pub labor_rate: Decimal,
    pub mileage_in: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Request payload for opening a work order.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateWorkOrderRequest {
    pub vehicle_id: Uuid,
    pub assigned_to: Option<Uuid>,

    #[validate(length(min = 1, max = 2000, message = "Description must be 1-2000 characters"))]
    pub description: String,

    #[validate(length(max = 4000, message = "Diagnosis must be at most 4000 characters"))]
    pub diagnosis: Option<String>,

    pub labor_rate: Option<Decimal>,

    #[validate(range(min = 0, max = 2_000_000, message = "Mileage must be between 0 and 2,000,000"))]
    pub mileage_in: Option<i32>,
}

/// Request payload for updating a work order's details.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateWorkOrderRequest {
    pub assigned_to: Option<Uuid>,

    #[validate(length(min = 1, max = 2000, message = "Description must be 1-2000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 4000, message = "Diagnosis must be at most 4000 characters"))]
    pub diagnosis: Option<String>,

    pub labor_hours: Option<Decimal>,
    pub labor_rate: Option<Decimal>,
}

/// Request payload for a status change.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWorkOrderStatusRequest {
    pub status: WorkOrderStatus,
}

/// Query parameters for listing work orders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkOrderFilter {
    pub status: Option<WorkOrderStatus>,
    pub vehicle_id: Option<Uuid>,
}

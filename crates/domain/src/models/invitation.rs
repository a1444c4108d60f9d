//! Payloads of the invitation and notification email functions.

use serde::{Deserialize, Serialize};
use shared::roles::BaseRole;
use uuid::Uuid;
use validator::Validate;

/// Body of the `send-invitation` function.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SendInvitationRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, max = 120, message = "Full name must be 1-120 characters"))]
    pub full_name: Option<String>,

    /// Role granted on signup; customers by default.
    pub role: Option<BaseRole>,

    #[validate(url(message = "redirect_to must be a URL"))]
    pub redirect_to: Option<String>,
}

impl SendInvitationRequest {
    pub fn role(&self) -> BaseRole {
        self.role.unwrap_or(BaseRole::Customer)
    }
}

/// Response of the `send-invitation` function.
#[derive(Debug, Clone, Serialize)]
pub struct SendInvitationResponse {
    pub success: bool,
    pub user_id: Option<Uuid>,
    pub message: String,
}

/// Category of a notification email; selects the subject prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    #[default]
    General,
    AppointmentReminder,
    EstimateReady,
    VehicleReady,
    InvoiceDue,
}

impl NotificationCategory {
    pub fn subject_prefix(&self) -> Option<&'static str> {
        match self {
            NotificationCategory::General => None,
            NotificationCategory::AppointmentReminder => Some("Appointment reminder"),
            NotificationCategory::EstimateReady => Some("Your estimate is ready"),
            NotificationCategory::VehicleReady => Some("Your vehicle is ready"),
            NotificationCategory::InvoiceDue => Some("Invoice due"),
        }
    }
}

/// Body of the `send-notification` function.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SendNotificationRequest {
    #[validate(email(message = "Invalid recipient address"))]
    pub to: String,

    #[validate(length(min = 1, max = 200, message = "Subject must be 1-200 characters"))]
    pub subject: String,

    #[validate(length(min = 1, max = 10000, message = "Message must be 1-10000 characters"))]
    pub message: String,

    #[serde(default)]
    pub category: NotificationCategory,
}

impl SendNotificationRequest {
    /// Subject line with the category prefix applied.
    pub fn full_subject(&self) -> String {
        match self.category.subject_prefix() {
            Some(prefix) => format!("{}: {}", prefix, self.subject),
            None => self.subject.clone(),
        }
    }
}

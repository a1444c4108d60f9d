//! Domain models for the auto shop.

pub mod appointment;
pub mod core_return;
pub mod estimate;
pub mod inventory;
pub mod invitation;
pub mod invoice;
pub mod profile;
pub mod rls_policy;
pub mod security_alert;
pub mod vehicle;
pub mod webauthn;
pub mod work_order;

pub use appointment::{Appointment, AppointmentStatus};
pub use core_return::CoreReturn;
pub use estimate::{Estimate, EstimateStatus, LineItem, LineItemKind};
pub use inventory::{InventoryItem, PartSale, SoldPart};
pub use invitation::{
    NotificationCategory, SendInvitationRequest, SendInvitationResponse, SendNotificationRequest,
};
pub use invoice::{Invoice, InvoiceStatus};
pub use profile::Profile;
pub use security_alert::{AlertSeverity, AlertType, NewSecurityAlert, SecurityAlert};
pub use vehicle::Vehicle;
pub use webauthn::{ChallengeType, WebAuthnChallenge};
pub use work_order::{WorkOrder, WorkOrderStatus};

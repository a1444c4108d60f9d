//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod appointment;
pub mod core_return;
pub mod estimate;
pub mod inventory;
pub mod invoice;
pub mod profile;
pub mod rls_policy;
pub mod security_alert;
pub mod vehicle;
pub mod webauthn_challenge;
pub mod work_order;

pub use appointment::AppointmentEntity;
pub use core_return::CoreReturnEntity;
pub use estimate::EstimateEntity;
pub use inventory::{InventoryEntity, PartSaleEntity};
pub use invoice::InvoiceEntity;
pub use profile::ProfileEntity;
pub use rls_policy::RlsPolicyEntity;
pub use security_alert::SecurityAlertEntity;
pub use vehicle::VehicleEntity;
pub use webauthn_challenge::WebAuthnChallengeEntity;
pub use work_order::WorkOrderEntity;

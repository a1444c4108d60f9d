//! Repository implementations for database operations.

pub mod appointment;
pub mod core_return;
pub mod estimate;
pub mod inventory;
pub mod invoice;
pub mod part_sale;
pub mod profile;
pub mod rls_policy;
pub mod security_alert;
pub mod vehicle;
pub mod webauthn_challenge;
pub mod work_order;

pub use appointment::{AppointmentRepository, BookingError, NewAppointment};
pub use core_return::CoreReturnRepository;
pub use estimate::{EstimateContent, EstimateRepository, NewEstimate};
pub use inventory::{InventoryChanges, InventoryRepository, NewInventoryItem};
pub use invoice::InvoiceRepository;
pub use part_sale::{PartSaleError, PartSaleRepository};
pub use profile::ProfileRepository;
pub use rls_policy::RlsPolicyRepository;
pub use security_alert::SecurityAlertRepository;
pub use vehicle::{NewVehicle, VehicleChanges, VehicleRepository};
pub use webauthn_challenge::WebAuthnChallengeRepository;
pub use work_order::{NewWorkOrder, WorkOrderChanges, WorkOrderRepository};

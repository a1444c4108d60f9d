//! Domain services for the auto shop.
//!
//! Services hold the business rules that operate on domain models. None of
//! them touch the database.

pub mod billing;
pub mod core_refund;
pub mod impersonation;
pub mod route_guard;
pub mod scheduling;
pub mod search;

pub use billing::{compute_totals, round_money, BillingError, Totals};
pub use core_refund::{refund_amount, CoreCondition, CoreRefundError};
pub use impersonation::{Identity, Overlay, OverlayError, OverlayMode, SessionInfo, OVERLAY_HEADER};
pub use route_guard::{decide, Access, RouteAccessResponse};
pub use scheduling::{Booking, SchedulingError, ShopHours, Slot};
pub use search::{SearchParams, SearchQuery};

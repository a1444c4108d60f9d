//! Domain layer for the auto shop backend.
//!
//! This crate contains:
//! - Domain models (profiles, vehicles, work orders, billing, inventory, appointments)
//! - Business rules (route guard, impersonation overlay, core refunds, billing totals,
//!   appointment availability, search normalization)

pub mod models;
pub mod services;

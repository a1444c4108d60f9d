//! Outbound service clients.

pub mod auth_admin;
pub mod email;
pub mod role_directory;

pub use auth_admin::{AuthAdminClient, AuthAdminError, Invite};
pub use email::{EmailError, EmailMessage, EmailService};
pub use role_directory::{ProfileRoles, RoleDirectory};

//! HTTP route handlers.

pub mod appointments;
pub mod core_returns;
pub mod estimates;
pub mod functions;
pub mod health;
pub mod inventory;
pub mod invoices;
pub mod me;
pub mod part_sales;
pub mod profiles;
pub mod route_access;
pub mod security_alerts;
pub mod session;
pub mod vehicles;
pub mod work_orders;

use domain::models::NewSecurityAlert;
use persistence::repositories::SecurityAlertRepository;

use crate::app::AppState;

/// Records a security alert. A failed insert is logged and never fails the
/// request that raised it.
pub(crate) async fn record_alert(state: &AppState, alert: NewSecurityAlert) {
    let alert_type = alert.alert_type;
    match SecurityAlertRepository::new(state.pool.clone())
        .create(&alert)
        .await
    {
        Ok(created) => {
            tracing::info!(alert_id = %created.id, alert_type = %alert_type, "Security alert recorded");
        }
        Err(e) => {
            tracing::error!(error = %e, alert_type = %alert_type, "Failed to record security alert");
        }
    }
}

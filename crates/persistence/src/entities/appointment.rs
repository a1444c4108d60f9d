//! Appointment entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::appointment::AppointmentStatus;
use domain::services::scheduling::Booking;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the appointments table.
#[derive(Debug, Clone, FromRow)]
pub struct AppointmentEntity {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub service_type: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentEntity {
    pub fn booking(&self) -> Booking {
        Booking::new(self.scheduled_at, self.duration_minutes)
    }
}

impl From<AppointmentEntity> for domain::models::Appointment {
    fn from(entity: AppointmentEntity) -> Self {
        let status = entity
            .status
            .parse::<AppointmentStatus>()
            .unwrap_or(AppointmentStatus::Scheduled);

        Self {
            id: entity.id,
            customer_id: entity.customer_id,
            vehicle_id: entity.vehicle_id,
            service_type: entity.service_type,
            scheduled_at: entity.scheduled_at,
            duration_minutes: entity.duration_minutes,
            status,
            notes: entity.notes,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

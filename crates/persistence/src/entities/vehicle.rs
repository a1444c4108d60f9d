//! Vehicle entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the vehicles table.
#[derive(Debug, Clone, FromRow)]
pub struct VehicleEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: Option<String>,
    pub license_plate: Option<String>,
    pub vehicle_type: Option<String>,
    pub mileage: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VehicleEntity> for domain::models::Vehicle {
    fn from(entity: VehicleEntity) -> Self {
        Self {
            id: entity.id,
            owner_id: entity.owner_id,
            make: entity.make,
            model: entity.model,
            year: entity.year,
            vin: entity.vin,
            license_plate: entity.license_plate,
            vehicle_type: entity.vehicle_type,
            mileage: entity.mileage,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

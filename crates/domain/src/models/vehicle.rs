//! Vehicle domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Represents a customer vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Vehicle {
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

/// Request payload for creating a vehicle.
///
/// `owner_id` is required when staff create a vehicle and ignored for customers.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateVehicleRequest {
    pub owner_id: Option<Uuid>,

    #[validate(length(min = 1, max = 50, message = "Make must be 1-50 characters"))]
    pub make: String,

    #[validate(length(min = 1, max = 50, message = "Model must be 1-50 characters"))]
    pub model: String,

    #[validate(custom(function = "shared::validation::validate_vehicle_year"))]
    pub year: i32,

    #[validate(custom(function = "shared::validation::validate_vin"))]
    pub vin: Option<String>,

    #[validate(custom(function = "shared::validation::validate_license_plate"))]
    pub license_plate: Option<String>,

    #[validate(length(max = 30, message = "Vehicle type must be at most 30 characters"))]
    pub vehicle_type: Option<String>,

    #[validate(range(min = 0, max = 2_000_000, message = "Mileage must be between 0 and 2,000,000"))]
    pub mileage: Option<i32>,
}

/// Request payload for updating a vehicle. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 50, message = "Make must be 1-50 characters"))]
    pub make: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Model must be 1-50 characters"))]
    pub model: Option<String>,

    #[validate(custom(function = "shared::validation::validate_vehicle_year"))]
    pub year: Option<i32>,

    #[validate(custom(function = "shared::validation::validate_vin"))]
    pub vin: Option<String>,

    #[validate(custom(function = "shared::validation::validate_license_plate"))]
    pub license_plate: Option<String>,

    #[validate(length(max = 30, message = "Vehicle type must be at most 30 characters"))]
    pub vehicle_type: Option<String>,

    #[validate(range(min = 0, max = 2_000_000, message = "Mileage must be between 0 and 2,000,000"))]
    pub mileage: Option<i32>,
}
